use std::fs;
use std::path::{Path, PathBuf};

use engine::{GridCoord, MovementConfig, MovementConfigError};
use serde::Deserialize;
use thiserror::Error;

pub(crate) const DEFAULT_MAX_HEALTH: u32 = 40;
pub(crate) const BUILT_IN_LEVEL_ORIGIN: &str = "<built-in>";

const BUILT_IN_LEVEL_JSON: &str = include_str!("../../levels/warehouse_entry.json");

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelFile {
    name: String,
    #[serde(default)]
    movement: MovementConfig,
    layout: Vec<String>,
    #[serde(default)]
    triggers: Vec<TriggerFile>,
    #[serde(default = "default_max_health")]
    max_health: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TriggerFile {
    cell: [i32; 2],
    lock_seconds: f32,
}

fn default_max_health() -> u32 {
    DEFAULT_MAX_HEALTH
}

/// Arriving on `cell` disables movement input for `lock_seconds`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TriggerZone {
    pub(crate) cell: GridCoord,
    pub(crate) lock_seconds: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Level {
    pub(crate) name: String,
    pub(crate) movement: MovementConfig,
    pub(crate) spawn: GridCoord,
    pub(crate) walls: Vec<GridCoord>,
    pub(crate) pushables: Vec<GridCoord>,
    pub(crate) triggers: Vec<TriggerZone>,
    pub(crate) max_health: u32,
}

#[derive(Debug, Error)]
pub(crate) enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level {origin} at {field}: {source}")]
    Parse {
        origin: String,
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid layout in level {origin}: {source}")]
    Layout {
        origin: String,
        #[source]
        source: LayoutError,
    },
    #[error("invalid movement settings in level {origin}: {source}")]
    Movement {
        origin: String,
        #[source]
        source: MovementConfigError,
    },
    #[error("trigger {index} in level {origin} has invalid lock_seconds {lock_seconds}")]
    Trigger {
        origin: String,
        index: usize,
        lock_seconds: f32,
    },
    #[error("level {origin} must start with max_health above zero")]
    ZeroHealth { origin: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum LayoutError {
    #[error("layout has no rows")]
    NoRows,
    #[error("row {row} is empty")]
    EmptyRow { row: usize },
    #[error("unknown glyph '{glyph}' at row {row}, column {column}")]
    UnknownGlyph {
        glyph: char,
        row: usize,
        column: usize,
    },
    #[error("no actor spawn '@' in layout")]
    MissingSpawn,
    #[error("second actor spawn at row {row}, column {column}")]
    DuplicateSpawn { row: usize, column: usize },
}

#[derive(Debug, Default, PartialEq)]
struct ParsedLayout {
    spawn: Option<GridCoord>,
    walls: Vec<GridCoord>,
    pushables: Vec<GridCoord>,
}

pub(crate) fn load_level(path: &Path) -> Result<Level, LevelError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_level(&raw, &path.display().to_string())
}

pub(crate) fn built_in_level() -> Result<Level, LevelError> {
    parse_level(BUILT_IN_LEVEL_JSON, BUILT_IN_LEVEL_ORIGIN)
}

pub(crate) fn parse_level(raw: &str, origin: &str) -> Result<Level, LevelError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let file: LevelFile = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let field = error.path().to_string();
        LevelError::Parse {
            origin: origin.to_string(),
            field,
            source: error.into_inner(),
        }
    })?;

    file.movement
        .validate()
        .map_err(|source| LevelError::Movement {
            origin: origin.to_string(),
            source,
        })?;
    if file.max_health == 0 {
        return Err(LevelError::ZeroHealth {
            origin: origin.to_string(),
        });
    }

    let layout = parse_layout(&file.layout).map_err(|source| LevelError::Layout {
        origin: origin.to_string(),
        source,
    })?;
    let spawn = layout.spawn.ok_or_else(|| LevelError::Layout {
        origin: origin.to_string(),
        source: LayoutError::MissingSpawn,
    })?;

    let mut triggers = Vec::with_capacity(file.triggers.len());
    for (index, trigger) in file.triggers.iter().enumerate() {
        if !trigger.lock_seconds.is_finite() || trigger.lock_seconds < 0.0 {
            return Err(LevelError::Trigger {
                origin: origin.to_string(),
                index,
                lock_seconds: trigger.lock_seconds,
            });
        }
        triggers.push(TriggerZone {
            cell: GridCoord::new(trigger.cell[0], trigger.cell[1]),
            lock_seconds: trigger.lock_seconds,
        });
    }

    Ok(Level {
        name: file.name,
        movement: file.movement,
        spawn,
        walls: layout.walls,
        pushables: layout.pushables,
        triggers,
        max_health: file.max_health,
    })
}

/// Row 0 is the top of the map, so row `r` of `n` lands on `y = n - 1 - r`.
fn parse_layout(rows: &[String]) -> Result<ParsedLayout, LayoutError> {
    if rows.is_empty() {
        return Err(LayoutError::NoRows);
    }

    let mut layout = ParsedLayout::default();
    let row_count = rows.len() as i32;
    for (row, line) in rows.iter().enumerate() {
        if line.is_empty() {
            return Err(LayoutError::EmptyRow { row });
        }
        let y = row_count - 1 - row as i32;
        for (column, glyph) in line.chars().enumerate() {
            let cell = GridCoord::new(column as i32, y);
            match glyph {
                '#' => layout.walls.push(cell),
                'B' => layout.pushables.push(cell),
                '@' => {
                    if layout.spawn.is_some() {
                        return Err(LayoutError::DuplicateSpawn { row, column });
                    }
                    layout.spawn = Some(cell);
                }
                '.' | ' ' => {}
                other => {
                    return Err(LayoutError::UnknownGlyph {
                        glyph: other,
                        row,
                        column,
                    })
                }
            }
        }
    }
    Ok(layout)
}
