//! Per-second timer tick

use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast::error::RecvError, time::MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::state::{AppState, LifecycleEvent};

/// Recompute the running timer once a second.
///
/// Each tick derives elapsed time from the wall clock, so a stalled or
/// skipped tick never loses time. The interval is reset when the app comes
/// back to the foreground so the display lines up with the corrected value.
pub async fn ticker_task(state: Arc<AppState>) {
    info!("Starting timer tick task");

    let mut lifecycle_rx = state.lifecycle_tx.subscribe();
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                match state.tick() {
                    Ok(Some(snapshot)) => debug!("Tick: {}", snapshot.display),
                    Ok(None) => {}
                    Err(e) => error!("Timer tick failed: {}", e),
                }
            }

            event = lifecycle_rx.recv() => {
                match event {
                    Ok(event @ (LifecycleEvent::Foreground | LifecycleEvent::Wake)) => {
                        debug!("{:?}, restarting tick interval", event);
                        interval.reset();
                    }
                    Ok(LifecycleEvent::Background) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Tick task missed {} lifecycle events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        info!("Lifecycle channel closed, stopping tick task");
                        break;
                    }
                }
            }
        }
    }
}
