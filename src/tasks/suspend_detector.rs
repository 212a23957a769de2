//! System sleep detection

use std::{sync::Arc, time::{Duration, Instant}};
use tokio::time::interval;
use tracing::{debug, info};

use crate::{
    state::{AppState, LifecycleEvent},
    utils::Clock,
};

/// Wall-clock gain over the monotonic clock that counts as a system sleep
const SLEEP_THRESHOLD_MS: i64 = 5_000;

/// Compares the wall clock with the monotonic clock between checks.
///
/// The monotonic clock stops while the machine sleeps and the wall clock
/// does not, so a large gap between the two means we were suspended.
#[derive(Debug)]
pub struct SuspendDetector {
    last_wall_ms: i64,
    last_instant: Instant,
}

impl SuspendDetector {
    pub fn new(now_ms: i64, now: Instant) -> Self {
        Self {
            last_wall_ms: now_ms,
            last_instant: now,
        }
    }

    /// Record a check. Returns the unaccounted wall-clock milliseconds when
    /// they exceed the sleep threshold.
    pub fn check(&mut self, now_ms: i64, now: Instant) -> Option<i64> {
        let wall_delta = now_ms - self.last_wall_ms;
        let mono_delta = now.duration_since(self.last_instant).as_millis() as i64;
        self.last_wall_ms = now_ms;
        self.last_instant = now;

        let gap = wall_delta - mono_delta;
        (gap > SLEEP_THRESHOLD_MS).then_some(gap)
    }
}

/// Background task that reports a wake-up after system sleep
pub async fn suspend_detector_task(state: Arc<AppState>, clock: Arc<dyn Clock>, check_every: Duration) {
    info!("Starting suspend detector task (every {:?})", check_every);

    let mut detector = SuspendDetector::new(clock.now_ms(), Instant::now());
    let mut interval = interval(check_every);

    loop {
        interval.tick().await;

        match detector.check(clock.now_ms(), Instant::now()) {
            Some(gap_ms) => {
                info!("System wake-up detected ({}s asleep), triggering recompute", gap_ms / 1000);
                state.notify_lifecycle(LifecycleEvent::Wake);
            }
            None => debug!("No suspension since last check"),
        }
    }
}
