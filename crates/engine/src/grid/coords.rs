use std::fmt;

use serde::{Deserialize, Serialize};

use crate::app::Vec2;

/// Integer cell address. `y` grows upward.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Polling priority when several directions are pressed in one tick.
    pub const PRIORITY: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, 1),
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub const fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    pub const fn facing(self) -> Option<Facing> {
        match self {
            Direction::Left => Some(Facing::Left),
            Direction::Right => Some(Facing::Right),
            Direction::Up | Direction::Down => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Horizontal sprite scale sign.
    pub const fn mirror_x(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Cell-to-world mapping: cell `(0, 0)` is centered on `origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGeometry {
    origin: Vec2,
    cell_size: f32,
}

impl CellGeometry {
    pub fn new(origin: Vec2, cell_size: f32) -> Self {
        Self { origin, cell_size }
    }

    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn cell_center(&self, cell: GridCoord) -> Vec2 {
        Vec2 {
            x: self.origin.x + cell.x as f32 * self.cell_size,
            y: self.origin.y + cell.y as f32 * self.cell_size,
        }
    }

    pub fn nearest_cell(&self, world_position: Vec2) -> GridCoord {
        GridCoord {
            x: ((world_position.x - self.origin.x) / self.cell_size).round() as i32,
            y: ((world_position.y - self.origin.y) / self.cell_size).round() as i32,
        }
    }
}
