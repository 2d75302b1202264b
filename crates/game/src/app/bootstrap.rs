use std::env;
use std::path::PathBuf;

use engine::{InputSource, LoopConfig, LoopPacing, Scene};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::cli::{self, CliOptions};
use super::gameplay::GridPuzzleScene;
use super::level::{built_in_level, load_level, LevelError, BUILT_IN_LEVEL_ORIGIN};
use super::report::ReportHandle;
use super::script::{ScriptError, ScriptInput};

pub(crate) const LEVEL_ENV_VAR: &str = "GRIDPUSH_LEVEL";
/// Tick limit for runs without a script, which would otherwise idle forever.
pub(crate) const IDLE_RUN_TICKS: u64 = 600;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
    pub(crate) input: Box<dyn InputSource>,
    pub(crate) report: ReportHandle,
    pub(crate) report_path: Option<PathBuf>,
}

pub(crate) enum Startup {
    Run(AppWiring),
    Help,
}

#[derive(Debug, Error)]
pub(crate) enum StartupError {
    #[error("{0}")]
    Usage(String),
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error(transparent)]
    Script(#[from] ScriptError),
}

pub(crate) fn build_app(args: &[String]) -> Result<Startup, StartupError> {
    let options = cli::parse_args(args).map_err(StartupError::Usage)?;
    if options.help {
        return Ok(Startup::Help);
    }
    init_tracing();
    info!(version = env!("CARGO_PKG_VERSION"), "gridpush_startup");
    wire_app(options, env::var(LEVEL_ENV_VAR)).map(Startup::Run)
}

fn wire_app(
    options: CliOptions,
    level_env: Result<String, env::VarError>,
) -> Result<AppWiring, StartupError> {
    let (level, origin) = match resolve_level_path(options.level, level_env)? {
        Some(path) => {
            let level = load_level(&path)?;
            (level, path.display().to_string())
        }
        None => (built_in_level()?, BUILT_IN_LEVEL_ORIGIN.to_string()),
    };
    info!(
        level = %level.name,
        origin = %origin,
        spawn = %level.spawn,
        walls = level.walls.len(),
        pushables = level.pushables.len(),
        "level_loaded"
    );

    let has_script = options.script.is_some();
    let input = match options.script {
        Some(path) => ScriptInput::load(&path)?,
        None => ScriptInput::idle(),
    };
    let max_ticks = match (options.max_ticks, has_script) {
        (Some(limit), _) => Some(limit),
        (None, true) => None,
        (None, false) => {
            info!(max_ticks = IDLE_RUN_TICKS, "no_script_idle_run");
            Some(IDLE_RUN_TICKS)
        }
    };

    let defaults = LoopConfig::default();
    let config = LoopConfig {
        target_tps: options.target_tps.unwrap_or(defaults.target_tps),
        max_ticks,
        pacing: if options.realtime {
            LoopPacing::Realtime
        } else {
            LoopPacing::Headless
        },
        ..defaults
    };

    let report = ReportHandle::default();
    let scene = GridPuzzleScene::new(level, report.clone());
    Ok(AppWiring {
        config,
        scene: Box::new(scene),
        input: Box::new(input),
        report,
        report_path: options.report,
    })
}

/// The command line wins over the environment; neither means the built-in level.
fn resolve_level_path(
    from_args: Option<PathBuf>,
    from_env: Result<String, env::VarError>,
) -> Result<Option<PathBuf>, StartupError> {
    if from_args.is_some() {
        return Ok(from_args);
    }
    match from_env {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(PathBuf::from(value))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(StartupError::EnvVar {
            var: LEVEL_ENV_VAR,
            source,
        }),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
