use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::warn;

static METRICS_POISON_REPORTED: AtomicBool = AtomicBool::new(false);

fn report_poisoned_metrics(operation: &'static str) {
    if !METRICS_POISON_REPORTED.swap(true, Ordering::Relaxed) {
        warn!(operation, "metrics_lock_poisoned");
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    pub tps: f32,
    pub tick_time_ms: f32,
    pub total_ticks: u64,
}

/// Shared view of the latest published loop metrics.
#[derive(Clone, Debug, Default)]
pub struct MetricsHandle {
    latest: Arc<RwLock<LoopMetricsSnapshot>>,
}

impl MetricsHandle {
    pub fn snapshot(&self) -> LoopMetricsSnapshot {
        let guard = self.latest.read().unwrap_or_else(|poisoned| {
            report_poisoned_metrics("read");
            poisoned.into_inner()
        });
        *guard
    }

    pub(crate) fn publish(&self, snapshot: LoopMetricsSnapshot) {
        let mut guard = self.latest.write().unwrap_or_else(|poisoned| {
            report_poisoned_metrics("write");
            poisoned.into_inner()
        });
        *guard = snapshot;
    }
}

#[derive(Debug)]
pub(crate) struct MetricsAccumulator {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
    tick_time_sum: Duration,
    total_ticks: u64,
}

impl MetricsAccumulator {
    pub(crate) fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval_start: now,
            interval,
            ticks: 0,
            tick_time_sum: Duration::ZERO,
            total_ticks: 0,
        }
    }

    pub(crate) fn record_tick(&mut self, tick_cost: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        self.total_ticks = self.total_ticks.saturating_add(1);
        self.tick_time_sum = self.tick_time_sum.saturating_add(tick_cost);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }
        let snapshot = self.snapshot_over(elapsed);
        self.interval_start = now;
        self.ticks = 0;
        self.tick_time_sum = Duration::ZERO;
        Some(snapshot)
    }

    pub(crate) fn final_snapshot(&self, now: Instant) -> LoopMetricsSnapshot {
        self.snapshot_over(now.saturating_duration_since(self.interval_start))
    }

    fn snapshot_over(&self, elapsed: Duration) -> LoopMetricsSnapshot {
        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let tick_time_ms = if self.ticks == 0 {
            0.0
        } else {
            self.tick_time_sum.as_secs_f32() * 1000.0 / self.ticks as f32
        };
        LoopMetricsSnapshot {
            tps: self.ticks as f32 / elapsed_seconds,
            tick_time_ms,
            total_ticks: self.total_ticks,
        }
    }
}
