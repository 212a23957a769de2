//! Signal handling for graceful shutdown and lifecycle transitions

use std::sync::Arc;

use futures::stream::StreamExt;
use signal_hook_tokio::Signals;
use tracing::{info, warn};

use crate::state::{AppState, LifecycleEvent};

/// Wait for shutdown signals (SIGTERM, SIGINT)
pub async fn shutdown_signal() {
    let mut signals = match Signals::new([
        signal_hook::consts::SIGTERM,
        signal_hook::consts::SIGINT,
    ]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Failed to register shutdown signals: {}", e);
            return std::future::pending().await;
        }
    };

    if let Some(signal) = signals.next().await {
        info!("Received signal: {}", signal);
    }
}

/// Translate job-control signals into lifecycle events: SIGTSTP means the
/// process is going to the background, SIGCONT that it was resumed.
///
/// Registering SIGTSTP replaces the default stop action, so the process keeps
/// running and the event is recorded instead.
pub async fn lifecycle_signals(state: Arc<AppState>) {
    let mut signals = match Signals::new([
        signal_hook::consts::SIGTSTP,
        signal_hook::consts::SIGCONT,
    ]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Failed to register lifecycle signals: {}", e);
            return;
        }
    };

    while let Some(signal) = signals.next().await {
        let event = match signal {
            signal_hook::consts::SIGTSTP => LifecycleEvent::Background,
            _ => LifecycleEvent::Foreground,
        };
        info!("Received signal {}, reporting {:?}", signal, event);
        state.notify_lifecycle(event);
    }
}
