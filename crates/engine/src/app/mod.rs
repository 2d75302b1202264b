mod input;
mod loop_runner;
mod metrics;
mod scene;

pub use input::{InputAction, InputEdgeTracker};
pub use loop_runner::{
    run_app, run_app_with_metrics, AppError, InputSource, LoopConfig, LoopPacing, LoopSummary,
    StopReason,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use scene::{
    Camera2D, InputSnapshot, Scene, SceneCommand, Vec2, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX,
    CAMERA_ZOOM_MIN, CAMERA_ZOOM_STEP,
};
