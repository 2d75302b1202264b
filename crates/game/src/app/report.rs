use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use engine::{Facing, GridCoord, Vec2};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ActorReport {
    pub(crate) cell: GridCoord,
    pub(crate) grid_position: Option<GridCoord>,
    pub(crate) world_position: Vec2,
    pub(crate) facing: Facing,
    pub(crate) is_moving: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct PushableReport {
    pub(crate) id: u64,
    pub(crate) cell: GridCoord,
    pub(crate) is_moving: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct CommandStats {
    pub(crate) started: u32,
    pub(crate) rejected: u32,
    pub(crate) ignored: u32,
}

/// End-of-run snapshot printed as JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StateReport {
    pub(crate) level: String,
    pub(crate) ticks: u64,
    pub(crate) stop_reason: Option<String>,
    pub(crate) actor: ActorReport,
    pub(crate) pushables: Vec<PushableReport>,
    pub(crate) footprints: Vec<GridCoord>,
    pub(crate) move_sounds: u32,
    pub(crate) moves_finished: u32,
    pub(crate) health: u32,
    pub(crate) max_health: u32,
    pub(crate) commands: CommandStats,
    pub(crate) camera_zoom: f32,
}

/// Hands the scene's final report back out of the loop runner.
#[derive(Clone, Debug, Default)]
pub(crate) struct ReportHandle {
    latest: Rc<RefCell<Option<StateReport>>>,
}

impl ReportHandle {
    pub(crate) fn publish(&self, report: StateReport) {
        *self.latest.borrow_mut() = Some(report);
    }

    pub(crate) fn take(&self) -> Option<StateReport> {
        self.latest.borrow_mut().take()
    }
}

#[derive(Debug, Error)]
pub(crate) enum ReportError {
    #[error("failed to encode state report: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to write state report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn render_report(report: &StateReport) -> Result<String, ReportError> {
    serde_json::to_string_pretty(report).map_err(ReportError::Encode)
}

/// Writes to `path` when given, otherwise to stdout.
pub(crate) fn write_report(report: &StateReport, path: Option<&Path>) -> Result<(), ReportError> {
    let json = render_report(report)?;
    match path {
        Some(path) => fs::write(path, json).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
