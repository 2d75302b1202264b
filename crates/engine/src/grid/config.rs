use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::LayerMask;

pub const DEFAULT_MOVE_SPEED: f32 = 5.0;
pub const DEFAULT_CELL_SIZE: f32 = 1.0;
pub const DEFAULT_PUSH_DELAY_SECONDS: f32 = 0.02;
pub const DEFAULT_ARRIVAL_EPSILON: f32 = 0.01;
pub const DEFAULT_WALL_LAYER: LayerMask = LayerMask(0b01);
pub const DEFAULT_PUSHABLE_LAYER: LayerMask = LayerMask(0b10);

/// Tuning for grid movement. Missing fields fall back to defaults when parsed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MovementConfig {
    pub move_speed: f32,
    pub cell_size: f32,
    pub wall_layer: LayerMask,
    pub pushable_layer: LayerMask,
    pub push_delay_seconds: f32,
    pub arrival_epsilon: f32,
    pub pushable_move_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: DEFAULT_MOVE_SPEED,
            cell_size: DEFAULT_CELL_SIZE,
            wall_layer: DEFAULT_WALL_LAYER,
            pushable_layer: DEFAULT_PUSHABLE_LAYER,
            push_delay_seconds: DEFAULT_PUSH_DELAY_SECONDS,
            arrival_epsilon: DEFAULT_ARRIVAL_EPSILON,
            pushable_move_speed: DEFAULT_MOVE_SPEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MovementConfigError {
    #[error("{field} must be finite and greater than zero (got {value})")]
    NotPositive { field: &'static str, value: f32 },
    #[error("push_delay_seconds must be finite and not negative (got {0})")]
    InvalidPushDelay(f32),
    #[error("arrival_epsilon must be in [0, cell_size / 2) (got {epsilon} for cell_size {cell_size})")]
    ArrivalEpsilonOutOfRange { epsilon: f32, cell_size: f32 },
    #[error("{field} must select at least one layer")]
    EmptyLayer { field: &'static str },
}

impl MovementConfig {
    pub fn validate(&self) -> Result<(), MovementConfigError> {
        require_positive("move_speed", self.move_speed)?;
        require_positive("cell_size", self.cell_size)?;
        require_positive("pushable_move_speed", self.pushable_move_speed)?;

        if !self.push_delay_seconds.is_finite() || self.push_delay_seconds < 0.0 {
            return Err(MovementConfigError::InvalidPushDelay(self.push_delay_seconds));
        }

        let epsilon_ok = self.arrival_epsilon.is_finite()
            && self.arrival_epsilon >= 0.0
            && self.arrival_epsilon < self.cell_size * 0.5;
        if !epsilon_ok {
            return Err(MovementConfigError::ArrivalEpsilonOutOfRange {
                epsilon: self.arrival_epsilon,
                cell_size: self.cell_size,
            });
        }

        if self.wall_layer.is_empty() {
            return Err(MovementConfigError::EmptyLayer {
                field: "wall_layer",
            });
        }
        if self.pushable_layer.is_empty() {
            return Err(MovementConfigError::EmptyLayer {
                field: "pushable_layer",
            });
        }
        Ok(())
    }
}

fn require_positive(field: &'static str, value: f32) -> Result<(), MovementConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MovementConfigError::NotPositive { field, value })
    }
}
