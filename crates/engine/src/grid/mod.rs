mod collaborators;
mod collision;
mod config;
mod controller;
mod coords;
mod motion;
mod occupancy;
mod push;
mod pushable;
mod world;

pub use collaborators::{
    Collaborators, CommandContext, FootprintSink, GridMapper, MoveCompletionListener,
    MoveSoundPlayer,
};
pub use collision::{CellQuery, CollisionResolver};
pub use config::{
    MovementConfig, MovementConfigError, DEFAULT_ARRIVAL_EPSILON, DEFAULT_CELL_SIZE,
    DEFAULT_MOVE_SPEED, DEFAULT_PUSHABLE_LAYER, DEFAULT_PUSH_DELAY_SECONDS, DEFAULT_WALL_LAYER,
};
pub use controller::{
    ActorState, Arrival, CommandOutcome, ControllerState, GridMovementController, IgnoreReason,
    MoveKind, RejectReason,
};
pub use coords::{CellGeometry, Direction, Facing, GridCoord};
pub use motion::step_toward;
pub use occupancy::{LayerMask, OccupancyIndex, PushableId};
pub use push::{PushCoordinator, PushStage};
pub use pushable::{PushableBody, PushableObjectState};
pub use world::{GridWorld, GridWorldError};
