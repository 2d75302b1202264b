use serde::{Deserialize, Serialize};
use tracing::info;

use super::input::{ActionStates, InputAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit { reason: &'static str },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    pressed: ActionStates,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_pressed(pressed: ActionStates) -> Self {
        Self { pressed }
    }

    pub fn is_pressed(&self, action: InputAction) -> bool {
        self.pressed.get(action)
    }

    pub fn with_action_pressed(mut self, action: InputAction, pressed: bool) -> Self {
        self.pressed.set(action, pressed);
        self
    }

    pub fn quit_requested(&self) -> bool {
        self.is_pressed(InputAction::Quit)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

pub const CAMERA_ZOOM_DEFAULT: f32 = 1.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 2.0;
pub const CAMERA_ZOOM_STEP: f32 = 0.25;
pub const CAMERA_ZOOM_RATE_PER_SECOND: f32 = 1.5;
const CAMERA_ZOOM_SETTLE_EPSILON: f32 = 0.0001;

/// Zoom changes animate toward a target; `is_zooming` reports an unsettled zoom.
#[derive(Debug, Clone, Copy)]
pub struct Camera2D {
    zoom: f32,
    zoom_target: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            zoom: CAMERA_ZOOM_DEFAULT,
            zoom_target: CAMERA_ZOOM_DEFAULT,
        }
    }
}

impl Camera2D {
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn zoom_target(&self) -> f32 {
        self.zoom_target
    }

    pub fn is_zooming(&self) -> bool {
        (self.zoom_target - self.zoom).abs() > CAMERA_ZOOM_SETTLE_EPSILON
    }

    pub fn apply_zoom_steps(&mut self, steps: i32) {
        if steps == 0 {
            return;
        }
        let target = self.zoom_target + steps as f32 * CAMERA_ZOOM_STEP;
        self.zoom_target = clamp_camera_zoom(target);
    }

    pub fn tick(&mut self, fixed_dt_seconds: f32) {
        if !self.is_zooming() {
            self.zoom = self.zoom_target;
            return;
        }
        let max_step = CAMERA_ZOOM_RATE_PER_SECOND * fixed_dt_seconds.max(0.0);
        let delta = self.zoom_target - self.zoom;
        if delta.abs() <= max_step {
            self.zoom = self.zoom_target;
        } else {
            self.zoom += max_step.copysign(delta);
        }
    }
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}

pub trait Scene {
    fn load(&mut self);
    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand;
    fn unload(&mut self);
    /// Whether the scene has no motion left in flight. The runner uses this to
    /// stop once input is exhausted.
    fn is_settled(&self) -> bool {
        true
    }
    fn debug_title(&self) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            is_loaded: false,
        }
    }

    pub(crate) fn load_if_needed(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load();
        self.is_loaded = true;
        info!(title = ?self.scene.debug_title(), "scene_loaded");
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        self.scene.update(fixed_dt_seconds, input)
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.scene.is_settled()
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload();
            self.is_loaded = false;
        }
    }
}
