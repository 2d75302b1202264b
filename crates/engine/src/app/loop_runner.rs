use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use super::metrics::MetricsAccumulator;
use super::scene::SceneRuntime;
use super::{InputSnapshot, LoopMetricsSnapshot, MetricsHandle, Scene, SceneCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPacing {
    /// Ticks run back to back with no wall-clock waiting.
    Headless,
    /// Ticks are paced against the wall clock through a frame accumulator.
    Realtime,
}

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_ticks: Option<u64>,
    pub pacing: LoopPacing,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_ticks: None,
            pacing: LoopPacing::Headless,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("target_tps must be greater than zero")]
    ZeroTickRate,
    #[error("max_ticks_per_frame must be greater than zero")]
    ZeroTicksPerFrame,
}

/// Feeds one input snapshot per simulation tick.
pub trait InputSource {
    /// Returns `None` once the source has nothing more to feed.
    fn snapshot_for_tick(&mut self, tick: u64) -> Option<InputSnapshot>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    InputExhausted,
    SceneQuit(&'static str),
    TickLimit,
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            StopReason::InputExhausted => "input_exhausted",
            StopReason::SceneQuit(reason) => reason,
            StopReason::TickLimit => "tick_limit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSummary {
    pub ticks: u64,
    pub simulated_seconds: f64,
    pub stop_reason: StopReason,
    pub metrics: LoopMetricsSnapshot,
}

pub fn run_app(
    config: LoopConfig,
    scene: Box<dyn Scene>,
    input: &mut dyn InputSource,
) -> Result<LoopSummary, AppError> {
    run_app_with_metrics(config, scene, input, MetricsHandle::default())
}

pub fn run_app_with_metrics(
    config: LoopConfig,
    scene: Box<dyn Scene>,
    input: &mut dyn InputSource,
    metrics_handle: MetricsHandle,
) -> Result<LoopSummary, AppError> {
    if config.target_tps == 0 {
        return Err(AppError::ZeroTickRate);
    }
    if config.max_ticks_per_frame == 0 {
        return Err(AppError::ZeroTicksPerFrame);
    }

    let fixed_dt = Duration::from_secs_f64(1.0 / config.target_tps as f64);
    let fixed_dt_seconds = fixed_dt.as_secs_f32();
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));

    info!(
        target_tps = config.target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = config.max_ticks_per_frame,
        max_ticks = ?config.max_ticks,
        pacing = ?config.pacing,
        "loop_config"
    );

    let mut runtime = SceneRuntime::new(scene);
    runtime.load_if_needed();

    let mut metrics = MetricsAccumulator::new(metrics_log_interval, Instant::now());
    let mut ticks: u64 = 0;
    let mut input_exhausted = false;
    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();

    let stop_reason = 'frames: loop {
        let ticks_this_frame = match config.pacing {
            LoopPacing::Headless => 1,
            LoopPacing::Realtime => {
                let now = Instant::now();
                let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                last_frame_instant = now;
                accumulator += clamp_frame_delta(raw_frame_dt, max_frame_delta);
                let plan = plan_sim_steps(accumulator, fixed_dt, config.max_ticks_per_frame);
                accumulator = plan.remaining_accumulator;
                if !plan.dropped_backlog.is_zero() {
                    warn!(
                        dropped_backlog_ms = plan.dropped_backlog.as_millis() as u64,
                        max_ticks_per_frame = config.max_ticks_per_frame,
                        "sim_backlog_dropped"
                    );
                }
                if plan.ticks_to_run == 0 {
                    thread::sleep(fixed_dt.saturating_sub(accumulator));
                    continue 'frames;
                }
                plan.ticks_to_run
            }
        };

        for _ in 0..ticks_this_frame {
            if config.max_ticks.is_some_and(|limit| ticks >= limit) {
                break 'frames StopReason::TickLimit;
            }

            let snapshot = if input_exhausted {
                None
            } else {
                input.snapshot_for_tick(ticks)
            };
            let snapshot = match snapshot {
                Some(snapshot) => snapshot,
                None => {
                    if !input_exhausted {
                        input_exhausted = true;
                        debug!(tick = ticks, "input_exhausted");
                    }
                    if runtime.is_settled() {
                        break 'frames StopReason::InputExhausted;
                    }
                    InputSnapshot::empty()
                }
            };

            let tick_start = Instant::now();
            let command = runtime.update(fixed_dt_seconds, &snapshot);
            metrics.record_tick(tick_start.elapsed());
            ticks = ticks.saturating_add(1);

            if let SceneCommand::Quit { reason } = command {
                info!(reason, tick = ticks, "shutdown_requested");
                break 'frames StopReason::SceneQuit(reason);
            }
        }

        if let Some(snapshot) = metrics.maybe_snapshot(Instant::now()) {
            metrics_handle.publish(snapshot);
            info!(
                tps = snapshot.tps,
                tick_time_ms = snapshot.tick_time_ms,
                total_ticks = snapshot.total_ticks,
                "loop_metrics"
            );
        }
    };

    runtime.shutdown();
    let final_metrics = metrics.final_snapshot(Instant::now());
    metrics_handle.publish(final_metrics);

    let summary = LoopSummary {
        ticks,
        simulated_seconds: ticks as f64 / config.target_tps as f64,
        stop_reason,
        metrics: final_metrics,
    };
    info!(
        ticks = summary.ticks,
        simulated_seconds = summary.simulated_seconds,
        stop_reason = summary.stop_reason.label(),
        "run_finished"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(accumulator: Duration, fixed_dt: Duration, max_ticks_per_frame: u32) -> StepPlan {
    let mut remaining = accumulator;
    let mut ticks_to_run = 0u32;
    while remaining >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        remaining -= fixed_dt;
        ticks_to_run += 1;
    }

    let dropped_backlog = if remaining >= fixed_dt {
        std::mem::take(&mut remaining)
    } else {
        Duration::ZERO
    };

    StepPlan {
        ticks_to_run,
        remaining_accumulator: remaining,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::InputAction;

    struct ScriptedInput {
        frames: Vec<InputSnapshot>,
    }

    impl InputSource for ScriptedInput {
        fn snapshot_for_tick(&mut self, tick: u64) -> Option<InputSnapshot> {
            self.frames.get(tick as usize).copied()
        }
    }

    struct EndlessInput;

    impl InputSource for EndlessInput {
        fn snapshot_for_tick(&mut self, _tick: u64) -> Option<InputSnapshot> {
            Some(InputSnapshot::empty())
        }
    }

    #[derive(Default)]
    struct SceneLog {
        updates: u32,
        quit_seen: bool,
        unloaded: bool,
    }

    struct CountingScene {
        log: Rc<RefCell<SceneLog>>,
        busy_ticks: u32,
    }

    impl Scene for CountingScene {
        fn load(&mut self) {}

        fn update(&mut self, _fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
            let mut log = self.log.borrow_mut();
            log.updates += 1;
            self.busy_ticks = self.busy_ticks.saturating_sub(1);
            if input.quit_requested() {
                log.quit_seen = true;
                return SceneCommand::Quit { reason: "scene_quit" };
            }
            SceneCommand::None
        }

        fn unload(&mut self) {
            self.log.borrow_mut().unloaded = true;
        }

        fn is_settled(&self) -> bool {
            self.busy_ticks == 0
        }
    }

    fn counting_scene(busy_ticks: u32) -> (Box<dyn Scene>, Rc<RefCell<SceneLog>>) {
        let log = Rc::new(RefCell::new(SceneLog::default()));
        let scene = CountingScene {
            log: Rc::clone(&log),
            busy_ticks,
        };
        (Box::new(scene), log)
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(10), max_frame_delta),
            Duration::from_millis(10)
        );
    }

    #[test]
    fn plan_sim_steps_keeps_partial_tick() {
        let plan = plan_sim_steps(Duration::from_millis(40), Duration::from_millis(16), 5);

        assert_eq!(plan.ticks_to_run, 2);
        assert_eq!(plan.remaining_accumulator, Duration::from_millis(8));
        assert_eq!(plan.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let plan = plan_sim_steps(Duration::from_millis(120), Duration::from_millis(16), 3);

        assert_eq!(plan.ticks_to_run, 3);
        assert_eq!(plan.remaining_accumulator, Duration::ZERO);
        assert_eq!(plan.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn headless_run_stops_when_input_runs_out_and_scene_settles() {
        let (scene, log) = counting_scene(0);
        let mut input = ScriptedInput {
            frames: vec![InputSnapshot::empty(); 3],
        };

        let summary = run_app(LoopConfig::default(), scene, &mut input).expect("run");

        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.stop_reason, StopReason::InputExhausted);
        assert_eq!(log.borrow().updates, 3);
        assert!(log.borrow().unloaded);
    }

    #[test]
    fn run_keeps_ticking_until_scene_settles() {
        let (scene, log) = counting_scene(10);
        let mut input = ScriptedInput {
            frames: vec![InputSnapshot::empty(); 2],
        };

        let summary = run_app(LoopConfig::default(), scene, &mut input).expect("run");

        assert_eq!(summary.ticks, 10);
        assert_eq!(log.borrow().updates, 10);
    }

    #[test]
    fn scene_quit_ends_run_with_reason() {
        let (scene, log) = counting_scene(0);
        let mut input = ScriptedInput {
            frames: vec![
                InputSnapshot::empty(),
                InputSnapshot::empty().with_action_pressed(InputAction::Quit, true),
                InputSnapshot::empty(),
            ],
        };

        let summary = run_app(LoopConfig::default(), scene, &mut input).expect("run");

        assert_eq!(summary.ticks, 2);
        assert_eq!(summary.stop_reason, StopReason::SceneQuit("scene_quit"));
        assert_eq!(summary.stop_reason.label(), "scene_quit");
        assert!(log.borrow().quit_seen);
    }

    #[test]
    fn tick_limit_bounds_endless_input() {
        let (scene, _log) = counting_scene(0);
        let config = LoopConfig {
            max_ticks: Some(25),
            ..LoopConfig::default()
        };
        let metrics = MetricsHandle::default();

        let summary =
            run_app_with_metrics(config, scene, &mut EndlessInput, metrics.clone()).expect("run");

        assert_eq!(summary.ticks, 25);
        assert_eq!(summary.stop_reason, StopReason::TickLimit);
        assert!((summary.simulated_seconds - 25.0 / 60.0).abs() < 1e-9);
        assert_eq!(metrics.snapshot().total_ticks, 25);
    }

    #[test]
    fn simulated_time_is_exact_for_tick_rate() {
        let (scene, _log) = counting_scene(0);
        let config = LoopConfig {
            target_tps: 30,
            max_ticks: Some(45),
            ..LoopConfig::default()
        };

        let summary = run_app(config, scene, &mut EndlessInput).expect("run");

        assert_eq!(summary.ticks, 45);
        assert_eq!(summary.simulated_seconds, 1.5);
    }

    #[test]
    fn zero_tick_rate_is_rejected() {
        let (scene, _log) = counting_scene(0);
        let config = LoopConfig {
            target_tps: 0,
            ..LoopConfig::default()
        };

        let error = run_app(config, scene, &mut EndlessInput).expect_err("zero tps");
        assert!(matches!(error, AppError::ZeroTickRate));
    }

    #[test]
    fn realtime_pacing_runs_requested_ticks() {
        let (scene, _log) = counting_scene(0);
        let config = LoopConfig {
            target_tps: 240,
            max_ticks: Some(6),
            pacing: LoopPacing::Realtime,
            ..LoopConfig::default()
        };

        let summary = run_app(config, scene, &mut EndlessInput).expect("run");

        assert_eq!(summary.ticks, 6);
        assert_eq!(summary.stop_reason, StopReason::TickLimit);
    }
}
