use std::fs;
use std::path::{Path, PathBuf};

use engine::{InputAction, InputEdgeTracker, InputSnapshot, InputSource};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScriptStep {
    /// One edge-triggered press on a single tick.
    Press(InputAction),
    /// Empty ticks.
    Wait(u64),
}

#[derive(Debug, Error)]
pub(crate) enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("script line {line}: unknown command '{command}'")]
    UnknownCommand { line: usize, command: String },
    #[error("script line {line}: '{command}' expects {expected}")]
    BadArgument {
        line: usize,
        command: &'static str,
        expected: &'static str,
    },
}

/// Replays a parsed command script, one step per tick.
#[derive(Debug)]
pub(crate) struct ScriptInput {
    steps: Vec<ScriptStep>,
    cursor: usize,
    wait_remaining: u64,
    idle_when_done: bool,
    tracker: InputEdgeTracker,
}

impl ScriptInput {
    pub(crate) fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps,
            cursor: 0,
            wait_remaining: 0,
            idle_when_done: false,
            tracker: InputEdgeTracker::new(),
        }
    }

    /// Never runs out; the run ends on a tick limit or a scene quit.
    pub(crate) fn idle() -> Self {
        Self {
            idle_when_done: true,
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn load(path: &Path) -> Result<Self, ScriptError> {
        let raw = fs::read_to_string(path).map_err(|source| ScriptError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let steps = parse_script(&raw)?;
        debug!(path = %path.display(), steps = steps.len(), "script_loaded");
        Ok(Self::new(steps))
    }

    fn press(&mut self, action: InputAction) -> InputSnapshot {
        self.tracker.set_action_down(action, true);
        let snapshot = self.tracker.snapshot_for_tick();
        self.tracker.release_all();
        snapshot
    }
}

impl InputSource for ScriptInput {
    fn snapshot_for_tick(&mut self, _tick: u64) -> Option<InputSnapshot> {
        loop {
            if self.wait_remaining > 0 {
                self.wait_remaining -= 1;
                return Some(self.tracker.snapshot_for_tick());
            }
            let Some(step) = self.steps.get(self.cursor).copied() else {
                return self.idle_when_done.then(InputSnapshot::empty);
            };
            self.cursor += 1;
            match step {
                ScriptStep::Wait(ticks) => self.wait_remaining = ticks,
                ScriptStep::Press(action) => return Some(self.press(action)),
            }
        }
    }
}

pub(crate) fn parse_script(raw: &str) -> Result<Vec<ScriptStep>, ScriptError> {
    let mut steps = Vec::new();
    for (index, line) in raw.lines().enumerate() {
        let line_number = index + 1;
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let mut words = content.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();
        let extra = words.next();

        let step = match (command.as_str(), argument, extra) {
            ("up", None, _) => ScriptStep::Press(InputAction::MoveUp),
            ("down", None, _) => ScriptStep::Press(InputAction::MoveDown),
            ("left", None, _) => ScriptStep::Press(InputAction::MoveLeft),
            ("right", None, _) => ScriptStep::Press(InputAction::MoveRight),
            ("quit", None, _) => ScriptStep::Press(InputAction::Quit),
            ("wait", Some(ticks), None) => {
                let ticks = ticks.parse::<u64>().map_err(|_| ScriptError::BadArgument {
                    line: line_number,
                    command: "wait",
                    expected: "a tick count",
                })?;
                ScriptStep::Wait(ticks)
            }
            ("wait", _, _) => {
                return Err(ScriptError::BadArgument {
                    line: line_number,
                    command: "wait",
                    expected: "a tick count",
                })
            }
            ("zoom", Some("in"), None) => ScriptStep::Press(InputAction::ZoomIn),
            ("zoom", Some("out"), None) => ScriptStep::Press(InputAction::ZoomOut),
            ("zoom", _, _) => {
                return Err(ScriptError::BadArgument {
                    line: line_number,
                    command: "zoom",
                    expected: "'in' or 'out'",
                })
            }
            _ => {
                return Err(ScriptError::UnknownCommand {
                    line: line_number,
                    command: content.to_string(),
                })
            }
        };
        steps.push(step);
    }
    Ok(steps)
}
