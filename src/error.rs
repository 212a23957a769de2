//! Error types shared by the timer, storage and remote API layers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::state::Phase;

/// Minimum length of a session that may be saved, in seconds
pub const MIN_SESSION_SECONDS: u64 = 60;

/// Errors from the local key-value persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}

/// Errors from the remote practice API
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-success status. The message is shown as-is.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors a timer action can fail with
#[derive(Error, Debug)]
pub enum TimerError {
    #[error("Please enter what you are practicing before starting the timer")]
    EmptyFocus,

    #[error("Set a weekly practice goal before starting the timer")]
    GoalNotSet,

    #[error("Too Short: practice for at least one minute before saving ({elapsed_seconds}s recorded)")]
    TooShort { elapsed_seconds: u64 },

    #[error("Cancelling discards this session; confirm to continue")]
    NotConfirmed,

    #[error("Cannot {action} while the timer is {phase}")]
    InvalidTransition { action: &'static str, phase: Phase },

    #[error("A save is already in progress")]
    SaveInProgress,

    #[error("{0}")]
    Remote(#[from] ApiError),

    #[error("Failed to persist timer state: {0}")]
    Storage(#[from] StoreError),

    #[error("Timer state lock poisoned")]
    Poisoned,
}

impl TimerError {
    /// Short machine-readable tag used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            TimerError::EmptyFocus => "empty_focus",
            TimerError::GoalNotSet => "goal_not_set",
            TimerError::TooShort { .. } => "too_short",
            TimerError::NotConfirmed => "not_confirmed",
            TimerError::InvalidTransition { .. } => "invalid_transition",
            TimerError::SaveInProgress => "save_in_progress",
            TimerError::Remote(_) => "remote",
            TimerError::Storage(_) => "storage",
            TimerError::Poisoned => "internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            TimerError::EmptyFocus
            | TimerError::GoalNotSet
            | TimerError::TooShort { .. }
            | TimerError::NotConfirmed => StatusCode::BAD_REQUEST,
            TimerError::InvalidTransition { .. } | TimerError::SaveInProgress => {
                StatusCode::CONFLICT
            }
            TimerError::Remote(_) => StatusCode::BAD_GATEWAY,
            TimerError::Storage(_) | TimerError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for TimerError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "status": "error",
            "kind": self.kind(),
            "message": self.to_string(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}
