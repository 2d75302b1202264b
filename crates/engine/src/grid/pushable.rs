use serde::Serialize;

use crate::app::Vec2;

use super::motion::step_toward;
use super::{CellGeometry, Direction, GridCoord, LayerMask, PushableId};

/// Observable state of a pushable object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PushableObjectState {
    pub world_position: Vec2,
    /// Committed cell; while moving this is the destination.
    pub cell: GridCoord,
    pub is_moving: bool,
    pub cell_size: f32,
}

#[derive(Debug, Clone)]
pub struct PushableBody {
    id: PushableId,
    layer: LayerMask,
    move_speed: f32,
    state: PushableObjectState,
    departed_from: Option<GridCoord>,
}

impl PushableBody {
    pub(crate) fn new(
        id: PushableId,
        cell: GridCoord,
        layer: LayerMask,
        move_speed: f32,
        geometry: &CellGeometry,
    ) -> Self {
        Self {
            id,
            layer,
            move_speed,
            state: PushableObjectState {
                world_position: geometry.cell_center(cell),
                cell,
                is_moving: false,
                cell_size: geometry.cell_size(),
            },
            departed_from: None,
        }
    }

    pub fn id(&self) -> PushableId {
        self.id
    }

    pub fn layer(&self) -> LayerMask {
        self.layer
    }

    pub fn state(&self) -> PushableObjectState {
        self.state
    }

    pub fn cell(&self) -> GridCoord {
        self.state.cell
    }

    pub fn is_moving(&self) -> bool {
        self.state.is_moving
    }

    pub fn world_position(&self) -> Vec2 {
        self.state.world_position
    }

    /// Commits a one-cell move. Returns `(from, to)`, or `None` if already moving.
    pub(crate) fn begin_push(&mut self, direction: Direction) -> Option<(GridCoord, GridCoord)> {
        if self.state.is_moving {
            return None;
        }
        let from = self.state.cell;
        let to = from.step(direction);
        self.state.cell = to;
        self.state.is_moving = true;
        self.departed_from = Some(from);
        Some((from, to))
    }

    /// Advances an in-flight move. Returns the vacated cell on arrival.
    pub(crate) fn advance(
        &mut self,
        fixed_dt_seconds: f32,
        geometry: &CellGeometry,
        arrival_epsilon: f32,
    ) -> Option<GridCoord> {
        if !self.state.is_moving {
            return None;
        }
        let target = geometry.cell_center(self.state.cell);
        let (next, arrived) = step_toward(
            self.state.world_position,
            target,
            self.move_speed,
            fixed_dt_seconds,
            arrival_epsilon,
        );
        self.state.world_position = next;
        if !arrived {
            return None;
        }
        self.state.is_moving = false;
        self.departed_from.take()
    }
}
