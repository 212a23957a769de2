//! Persisted timer record and partial updates to it

use serde::{Deserialize, Serialize};

/// Timer record as written to local storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub elapsed_seconds: u64,
    /// Epoch milliseconds of the last (re)start, only set while running
    pub start_time: Option<i64>,
    pub is_running: bool,
    pub focus: String,
    /// Elapsed seconds frozen when the current run began
    #[serde(default)]
    pub base_elapsed_seconds: u64,
    /// Epoch milliseconds of the first start of this session
    #[serde(default)]
    pub session_start_time: Option<i64>,
}

impl TimerState {
    /// Create an empty timer state
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply every field present in `patch`, leaving the rest untouched
    pub fn merge(&mut self, patch: TimerStatePatch) {
        if let Some(elapsed) = patch.elapsed_seconds {
            self.elapsed_seconds = elapsed;
        }
        if let Some(start_time) = patch.start_time {
            self.start_time = start_time;
        }
        if let Some(is_running) = patch.is_running {
            self.is_running = is_running;
        }
        if let Some(focus) = patch.focus {
            self.focus = focus;
        }
        if let Some(base) = patch.base_elapsed_seconds {
            self.base_elapsed_seconds = base;
        }
        if let Some(session_start) = patch.session_start_time {
            self.session_start_time = session_start;
        }
    }
}

/// Partial update of a [`TimerState`]. `None` means "keep the stored value".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimerStatePatch {
    pub elapsed_seconds: Option<u64>,
    pub start_time: Option<Option<i64>>,
    pub is_running: Option<bool>,
    pub focus: Option<String>,
    pub base_elapsed_seconds: Option<u64>,
    pub session_start_time: Option<Option<i64>>,
}

impl TimerStatePatch {
    /// Patch that only updates the elapsed counter
    pub fn elapsed(elapsed_seconds: u64) -> Self {
        Self {
            elapsed_seconds: Some(elapsed_seconds),
            ..Self::default()
        }
    }
}

impl From<TimerState> for TimerStatePatch {
    fn from(state: TimerState) -> Self {
        Self {
            elapsed_seconds: Some(state.elapsed_seconds),
            start_time: Some(state.start_time),
            is_running: Some(state.is_running),
            focus: Some(state.focus),
            base_elapsed_seconds: Some(state.base_elapsed_seconds),
            session_start_time: Some(state.session_start_time),
        }
    }
}
