pub mod app;
pub mod grid;

pub use app::{
    run_app, run_app_with_metrics, AppError, Camera2D, InputAction, InputEdgeTracker,
    InputSnapshot, InputSource, LoopConfig, LoopMetricsSnapshot, LoopPacing, LoopSummary,
    MetricsHandle, Scene, SceneCommand, StopReason, Vec2,
};
pub use grid::{
    ActorState, Arrival, CellGeometry, CellQuery, Collaborators, CollisionResolver,
    CommandContext, CommandOutcome, ControllerState, Direction, Facing, FootprintSink,
    GridCoord, GridMapper, GridMovementController, GridWorld, GridWorldError, IgnoreReason,
    LayerMask, MoveCompletionListener, MoveKind, MoveSoundPlayer, MovementConfig,
    MovementConfigError, OccupancyIndex, PushCoordinator, PushStage, PushableBody, PushableId,
    PushableObjectState, RejectReason,
};
