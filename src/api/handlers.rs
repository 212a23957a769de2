//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{info, warn};

use crate::{
    error::TimerError,
    state::{AppState, LifecycleEvent},
};
use super::responses::{
    ApiResponse, CancelRequest, HealthResponse, SaveRequest, StartRequest, StatusResponse,
};

type ActionResult = Result<Json<ApiResponse>, TimerError>;

/// Handle POST /timer/start - Start a session for the given focus
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> ActionResult {
    let timer = state.start(&request.focus).await.map_err(|e| {
        warn!("Start rejected: {}", e);
        e
    })?;
    Ok(Json(ApiResponse::ok("Timer started", timer)))
}

/// Handle POST /timer/pause
pub async fn pause_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    let timer = state.pause()?;
    Ok(Json(ApiResponse::ok("Timer paused", timer)))
}

/// Handle POST /timer/resume
pub async fn resume_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    let timer = state.resume()?;
    Ok(Json(ApiResponse::ok("Timer resumed", timer)))
}

/// Handle POST /timer/finish - Stop the timer and wait for notes
pub async fn finish_handler(State(state): State<Arc<AppState>>) -> ActionResult {
    let timer = state.finish()?;
    Ok(Json(ApiResponse::ok("Timer stopped, add notes to save", timer)))
}

/// Handle POST /timer/save - Submit the finished session
pub async fn save_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SaveRequest>,
) -> ActionResult {
    let timer = state.save(&request.notes).await?;
    info!("Save endpoint called - session submitted");
    Ok(Json(ApiResponse::ok("Practice session saved", timer)))
}

/// Handle POST /timer/cancel - Discard the session once confirmed
pub async fn cancel_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CancelRequest>,
) -> ActionResult {
    let timer = state.cancel(request.confirm)?;
    Ok(Json(ApiResponse::ok("Practice session discarded", timer)))
}

/// Handle POST /lifecycle/:event - Report a background/foreground transition
pub async fn lifecycle_handler(
    State(state): State<Arc<AppState>>,
    Path(event): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let event = match event.as_str() {
        "background" => LifecycleEvent::Background,
        "foreground" => LifecycleEvent::Foreground,
        other => {
            warn!("Unknown lifecycle event: {}", other);
            return Err(StatusCode::NOT_FOUND);
        }
    };

    state.notify_lifecycle(event);
    Ok(StatusCode::ACCEPTED)
}

/// Handle GET /timer - Return current timer status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, TimerError> {
    let timer = state.snapshot()?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer,
        in_background: state.is_in_background(),
        uptime: state.get_uptime(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
