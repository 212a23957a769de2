//! Elapsed-time calculation from wall-clock timestamps

/// Elapsed seconds for a run that began at `start_time_ms` on top of
/// `base_elapsed` already accumulated.
///
/// The value is always derived from the wall clock, never from a count of
/// ticks, so it stays correct after the process was suspended. A start time
/// in the future (clock moved backwards) clamps to `base_elapsed`.
pub fn compute_elapsed(base_elapsed: u64, start_time_ms: i64, now_ms: i64) -> u64 {
    if now_ms < start_time_ms {
        return base_elapsed;
    }
    let delta_seconds = now_ms.saturating_sub(start_time_ms) / 1000;
    base_elapsed.saturating_add(delta_seconds as u64)
}
