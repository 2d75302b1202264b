use std::process::ExitCode;

use engine::{run_app, LoopSummary};
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::report::{write_report, ReportHandle, StateReport};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        scene,
        mut input,
        report,
        report_path,
    } = app;

    let summary = match run_app(config, scene, input.as_mut()) {
        Ok(summary) => summary,
        Err(err) => {
            error!(error = %err, "loop_config_invalid");
            return ExitCode::FAILURE;
        }
    };
    let Some(state) = finalize_report(&report, &summary) else {
        warn!("state_report_missing");
        return ExitCode::FAILURE;
    };
    info!(
        level = %state.level,
        stop_reason = summary.stop_reason.label(),
        to_file = report_path.is_some(),
        "report_ready"
    );
    if let Err(err) = write_report(&state, report_path.as_deref()) {
        error!(error = %err, "report_write_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Takes the scene's published report and stamps why the run stopped.
fn finalize_report(report: &ReportHandle, summary: &LoopSummary) -> Option<StateReport> {
    let mut state = report.take()?;
    state.stop_reason = Some(summary.stop_reason.label().to_string());
    Some(state)
}
