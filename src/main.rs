//! Practice Timer - a wall-clock practice timer service
//!
//! This is the main entry point for the practice-timer application.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use practice_timer::{
    api::create_router,
    config::Config,
    services::{FileStore, HttpPracticeApi, TimerStore},
    state::AppState,
    tasks::{lifecycle_observer_task, suspend_detector_task, ticker_task},
    utils::{lifecycle_signals, shutdown_signal, Clock, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("practice_timer={},tower_http=info", config.log_level()))
        .init();

    info!("Starting practice-timer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, api={}, state_file={}",
        config.host,
        config.port,
        config.api_url,
        config.state_file.display()
    );

    let api = Arc::new(HttpPracticeApi::new(config.api_url.clone(), config.token.clone()));
    if !api.is_connected() {
        tracing::warn!("No API token configured, requests will be unauthenticated");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = TimerStore::new(FileStore::new(config.state_file.clone()));

    // Create application state and pick up any session left from a previous run
    let state = Arc::new(AppState::new(store, api, Arc::clone(&clock)));
    let restored = state.restore()?;
    info!("Timer ready: phase={} elapsed={}", restored.phase, restored.display);

    tokio::spawn(ticker_task(Arc::clone(&state)));
    tokio::spawn(lifecycle_observer_task(Arc::clone(&state)));
    tokio::spawn(lifecycle_signals(Arc::clone(&state)));
    tokio::spawn(suspend_detector_task(
        Arc::clone(&state),
        clock,
        config.wake_check_interval(),
    ));

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET  /timer                 - Current timer status");
    info!("  POST /timer/start           - Start a session {{focus}}");
    info!("  POST /timer/pause           - Pause the running timer");
    info!("  POST /timer/resume          - Resume a paused or stopped timer");
    info!("  POST /timer/finish          - Stop and wait for notes");
    info!("  POST /timer/save            - Submit the session {{notes}}");
    info!("  POST /timer/cancel          - Discard the session {{confirm}}");
    info!("  POST /lifecycle/:event      - Report background/foreground");
    info!("  GET  /health                - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
