//! App lifecycle observer

use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use crate::state::{AppState, LifecycleEvent};

/// Apply background/foreground transitions to the timer.
///
/// Nothing is kept alive while in the background; correctness is recovered
/// on foreground by recomputing from the persisted start time.
pub async fn lifecycle_observer_task(state: Arc<AppState>) {
    info!("Starting lifecycle observer task");

    let mut lifecycle_rx = state.lifecycle_tx.subscribe();

    loop {
        match lifecycle_rx.recv().await {
            Ok(event) => {
                debug!("Lifecycle event: {:?}", event);
                if let Err(e) = state.handle_lifecycle(event) {
                    error!("Failed to handle {:?}: {}", event, e);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                // Whatever was missed, a recompute brings the timer up to date
                warn!("Lifecycle observer missed {} events, recomputing", skipped);
                if let Err(e) = state.handle_lifecycle(LifecycleEvent::Foreground) {
                    error!("Failed to recompute after lag: {}", e);
                }
            }
            Err(RecvError::Closed) => {
                info!("Lifecycle channel closed, stopping observer");
                break;
            }
        }
    }
}
