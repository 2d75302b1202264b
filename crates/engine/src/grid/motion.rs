use crate::app::Vec2;

/// Moves `current` toward `target` by at most `speed * fixed_dt_seconds`.
///
/// Returns the new position and whether the mover arrived. On arrival the
/// returned position is exactly `target`; the step never overshoots.
pub fn step_toward(
    current: Vec2,
    target: Vec2,
    speed: f32,
    fixed_dt_seconds: f32,
    arrival_epsilon: f32,
) -> (Vec2, bool) {
    let distance = current.distance(target);
    let max_step = (speed * fixed_dt_seconds).max(0.0);

    if distance <= max_step {
        return (target, true);
    }

    let remaining = distance - max_step;
    if remaining <= arrival_epsilon {
        return (target, true);
    }

    let scale = max_step / distance;
    let next = Vec2 {
        x: current.x + (target.x - current.x) * scale,
        y: current.y + (target.y - current.y) * scale,
    };
    (next, false)
}
