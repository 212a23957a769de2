//! Practice timer state machine
//!
//! The machine is pure: every transition takes the current wall-clock time in
//! epoch milliseconds and never performs I/O. Persistence and the remote save
//! are driven by [`AppState`](super::AppState).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{elapsed::compute_elapsed, TimerState};
use crate::error::{TimerError, MIN_SESSION_SECONDS};
use crate::services::PracticeSessionRequest;

/// Phase of the current practice session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No session; setup screen
    Idle,
    Running,
    Paused,
    /// Finished, waiting for notes
    Stopped,
    Saved,
    Cancelled,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running => "running",
            Phase::Paused => "paused",
            Phase::Stopped => "stopped",
            Phase::Saved => "saved",
            Phase::Cancelled => "cancelled",
        }
    }

    /// Whether a new session may be started from this phase
    pub fn can_start(&self) -> bool {
        matches!(self, Phase::Idle | Phase::Saved | Phase::Cancelled)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerMachine {
    phase: Phase,
    focus: String,
    elapsed_seconds: u64,
    base_elapsed: u64,
    start_time: Option<i64>,
    session_start_time: Option<i64>,
}

impl Default for TimerMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerMachine {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            focus: String::new(),
            elapsed_seconds: 0,
            base_elapsed: 0,
            start_time: None,
            session_start_time: None,
        }
    }

    /// Rebuild the machine from a persisted record.
    ///
    /// A running record is recomputed from its start time: the process may
    /// have been killed and relaunched long after the record was written.
    pub fn restore(saved: TimerState, now_ms: i64) -> Self {
        let mut machine = Self {
            phase: Phase::Idle,
            focus: saved.focus,
            elapsed_seconds: saved.elapsed_seconds,
            base_elapsed: saved.base_elapsed_seconds,
            start_time: None,
            session_start_time: saved.session_start_time,
        };

        match (saved.is_running, saved.start_time) {
            (true, Some(start_time)) => {
                machine.phase = Phase::Running;
                machine.start_time = Some(start_time);
                machine.recompute(now_ms);
            }
            _ => {
                // Paused snapshots carry their frozen value in elapsed_seconds
                machine.base_elapsed = machine.base_elapsed.max(machine.elapsed_seconds);
                machine.elapsed_seconds = machine.base_elapsed;
                if machine.elapsed_seconds > 0 || !machine.focus.trim().is_empty() {
                    machine.phase = Phase::Paused;
                }
            }
        }

        machine
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn focus(&self) -> &str {
        &self.focus
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn start_time(&self) -> Option<i64> {
        self.start_time
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    /// Snapshot to persist
    pub fn snapshot(&self) -> TimerState {
        TimerState {
            elapsed_seconds: self.elapsed_seconds,
            start_time: self.start_time,
            is_running: self.is_running(),
            focus: self.focus.clone(),
            base_elapsed_seconds: self.base_elapsed,
            session_start_time: self.session_start_time,
        }
    }

    /// Check the inputs of a start without changing state.
    pub fn validate_start(&self, focus: &str) -> Result<(), TimerError> {
        if !self.phase.can_start() {
            return Err(self.invalid("start"));
        }
        if focus.trim().is_empty() {
            return Err(TimerError::EmptyFocus);
        }
        Ok(())
    }

    /// Begin a new session. `weekly_goal` is the user's goal in minutes as
    /// reported by the remote stats endpoint.
    pub fn start(
        &mut self,
        focus: &str,
        weekly_goal: Option<u32>,
        now_ms: i64,
    ) -> Result<(), TimerError> {
        self.validate_start(focus)?;
        if weekly_goal.unwrap_or(0) == 0 {
            return Err(TimerError::GoalNotSet);
        }

        self.phase = Phase::Running;
        self.focus = focus.trim().to_string();
        self.elapsed_seconds = 0;
        self.base_elapsed = 0;
        self.start_time = Some(now_ms);
        self.session_start_time = Some(now_ms);
        Ok(())
    }

    pub fn pause(&mut self, now_ms: i64) -> Result<(), TimerError> {
        if self.phase != Phase::Running {
            return Err(self.invalid("pause"));
        }
        self.freeze(now_ms);
        self.phase = Phase::Paused;
        Ok(())
    }

    /// Resume a paused session, or go back to the timer from the notes step
    pub fn resume(&mut self, now_ms: i64) -> Result<(), TimerError> {
        if !matches!(self.phase, Phase::Paused | Phase::Stopped) {
            return Err(self.invalid("resume"));
        }
        self.base_elapsed = self.base_elapsed.max(self.elapsed_seconds);
        self.elapsed_seconds = self.base_elapsed;
        self.start_time = Some(now_ms);
        self.phase = Phase::Running;
        Ok(())
    }

    pub fn finish(&mut self, now_ms: i64) -> Result<(), TimerError> {
        match self.phase {
            Phase::Running => self.freeze(now_ms),
            Phase::Paused => {}
            _ => return Err(self.invalid("finish")),
        }
        self.phase = Phase::Stopped;
        Ok(())
    }

    /// Build the submission for a finished session. Does not change state;
    /// call [`mark_saved`](Self::mark_saved) once the remote accepted it.
    pub fn prepare_save(&self, notes: &str, now_ms: i64) -> Result<PracticeSessionRequest, TimerError> {
        if self.phase != Phase::Stopped {
            return Err(self.invalid("save"));
        }
        if self.elapsed_seconds < MIN_SESSION_SECONDS {
            return Err(TimerError::TooShort {
                elapsed_seconds: self.elapsed_seconds,
            });
        }

        let elapsed_ms = i64::try_from(self.elapsed_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
        let session_start = self
            .session_start_time
            .unwrap_or_else(|| now_ms.saturating_sub(elapsed_ms));

        Ok(PracticeSessionRequest {
            minutes: self.elapsed_seconds / 60,
            focus: self.focus.clone(),
            notes: notes.trim().to_string(),
            start_time: timestamp(session_start),
            end_time: timestamp(now_ms),
        })
    }

    pub fn mark_saved(&mut self) {
        self.reset(Phase::Saved);
    }

    pub fn cancel(&mut self) {
        self.reset(Phase::Cancelled);
    }

    /// Recompute elapsed time from the wall clock while running.
    ///
    /// Returns true when the visible value changed.
    pub fn recompute(&mut self, now_ms: i64) -> bool {
        let Some(start_time) = self.start_time else {
            return false;
        };
        if self.phase != Phase::Running {
            return false;
        }
        let current = compute_elapsed(self.base_elapsed, start_time, now_ms).max(self.elapsed_seconds);
        let changed = current != self.elapsed_seconds;
        self.elapsed_seconds = current;
        changed
    }

    fn freeze(&mut self, now_ms: i64) {
        self.recompute(now_ms);
        self.base_elapsed = self.base_elapsed.max(self.elapsed_seconds);
        self.elapsed_seconds = self.base_elapsed;
        self.start_time = None;
    }

    fn reset(&mut self, phase: Phase) {
        *self = Self::new();
        self.phase = phase;
    }

    fn invalid(&self, action: &'static str) -> TimerError {
        TimerError::InvalidTransition {
            action,
            phase: self.phase,
        }
    }
}

fn timestamp(ms: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms).unwrap_or_default()
}
