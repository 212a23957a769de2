//! Main application state management

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use super::{Phase, TimerMachine, TimerStatePatch};
use crate::{
    error::TimerError,
    services::{PracticeApi, TimerStore},
    utils::{format_elapsed, Clock},
};

/// App lifecycle transitions reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    Background,
    Foreground,
    /// The host woke from sleep; the app's own foreground state is unchanged
    Wake,
}

/// Timer view published to the API and to watchers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub phase: Phase,
    pub elapsed_seconds: u64,
    /// `MM:SS` or `H:MM:SS`
    pub display: String,
    pub is_running: bool,
    pub start_time: Option<i64>,
    pub focus: String,
    pub saving: bool,
}

impl TimerSnapshot {
    fn from_machine(machine: &TimerMachine, saving: bool) -> Self {
        Self {
            phase: machine.phase(),
            elapsed_seconds: machine.elapsed_seconds(),
            display: format_elapsed(machine.elapsed_seconds()),
            is_running: machine.is_running(),
            start_time: machine.start_time(),
            focus: machine.focus().to_string(),
            saving,
        }
    }
}

/// Shared state owning the timer, its persistence and the remote API
pub struct AppState {
    machine: Mutex<TimerMachine>,
    store: TimerStore,
    api: Arc<dyn PracticeApi>,
    clock: Arc<dyn Clock>,
    /// Set while a save request is in flight
    saving: AtomicBool,
    in_background: AtomicBool,
    /// Server metadata
    pub started_at: Instant,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Channel for timer updates
    pub timer_update_tx: watch::Sender<TimerSnapshot>,
    /// Keep the receiver alive to prevent channel closure
    pub _timer_update_rx: watch::Receiver<TimerSnapshot>,
    /// Channel for lifecycle notifications
    pub lifecycle_tx: broadcast::Sender<LifecycleEvent>,
}

impl AppState {
    /// Create a new AppState with an idle timer
    pub fn new(store: TimerStore, api: Arc<dyn PracticeApi>, clock: Arc<dyn Clock>) -> Self {
        let machine = TimerMachine::new();
        let (timer_update_tx, timer_update_rx) =
            watch::channel(TimerSnapshot::from_machine(&machine, false));
        let (lifecycle_tx, _) = broadcast::channel(16);

        Self {
            machine: Mutex::new(machine),
            store,
            api,
            clock,
            saving: AtomicBool::new(false),
            in_background: AtomicBool::new(false),
            started_at: Instant::now(),
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            timer_update_tx,
            _timer_update_rx: timer_update_rx,
            lifecycle_tx,
        }
    }

    /// Load the persisted record, recomputing a running timer from its start time
    pub fn restore(&self) -> Result<TimerSnapshot, TimerError> {
        let saved = self.store.load()?;
        let mut machine = self.lock()?;

        match saved {
            Some(saved) => {
                *machine = TimerMachine::restore(saved, self.clock.now_ms());
                info!(
                    "Restored timer: phase={} elapsed={}s focus={:?}",
                    machine.phase(),
                    machine.elapsed_seconds(),
                    machine.focus()
                );
                self.persist(&machine);
            }
            None => debug!("No saved timer state"),
        }

        Ok(self.publish(&machine))
    }

    /// Start a new session. The focus is checked before the weekly goal is
    /// fetched, so an empty focus never causes a network call.
    pub async fn start(&self, focus: &str) -> Result<TimerSnapshot, TimerError> {
        {
            let machine = self.lock()?;
            self.ensure_not_saving()?;
            machine.validate_start(focus)?;
        }

        let stats = self.api.fetch_stats().await?;

        let mut machine = self.lock()?;
        self.ensure_not_saving()?;
        machine.start(focus, stats.weekly_goal, self.clock.now_ms())?;
        info!("Practice timer started: focus={:?}", machine.focus());
        self.persist(&machine);
        self.record_action("start");
        Ok(self.publish(&machine))
    }

    pub fn pause(&self) -> Result<TimerSnapshot, TimerError> {
        self.transition("pause", |machine, now| machine.pause(now))
    }

    /// Fails with [`TimerError::SaveInProgress`] while the finished session is
    /// being submitted.
    pub fn resume(&self) -> Result<TimerSnapshot, TimerError> {
        self.transition("resume", |machine, now| machine.resume(now))
    }

    /// Fails with [`TimerError::SaveInProgress`] while a save is in flight.
    pub fn finish(&self) -> Result<TimerSnapshot, TimerError> {
        self.transition("finish", |machine, now| machine.finish(now))
    }

    /// Submit the finished session. A failed request leaves the session in
    /// place so the user can retry.
    pub async fn save(&self, notes: &str) -> Result<TimerSnapshot, TimerError> {
        if self.saving.swap(true, Ordering::SeqCst) {
            return Err(TimerError::SaveInProgress);
        }
        self.publish_current();

        let result = self.submit(notes).await;
        self.saving.store(false, Ordering::SeqCst);

        if let Err(e) = result {
            warn!("Save failed: {}", e);
            self.publish_current();
            return Err(e);
        }
        let machine = self.lock()?;
        Ok(self.publish(&machine))
    }

    async fn submit(&self, notes: &str) -> Result<(), TimerError> {
        let request = {
            let machine = self.lock()?;
            machine.prepare_save(notes, self.clock.now_ms())?
        };
        let minutes = request.minutes;

        self.api.submit_session(request).await?;

        let mut machine = self.lock()?;
        if machine.phase() != Phase::Stopped {
            // Cancelled (and maybe restarted) while the request was in flight
            warn!("Session saved remotely after it was discarded locally");
            return Ok(());
        }
        machine.mark_saved();
        self.store.clear()?;
        info!("Practice session of {} min saved", minutes);
        self.record_action("save");
        Ok(())
    }

    /// Discard the session. Without confirmation nothing changes.
    pub fn cancel(&self, confirmed: bool) -> Result<TimerSnapshot, TimerError> {
        if !confirmed {
            return Err(TimerError::NotConfirmed);
        }

        let mut machine = self.lock()?;
        let discarded = machine.elapsed_seconds();
        machine.cancel();
        self.store.clear()?;
        info!("Practice session cancelled, discarded {}s", discarded);
        self.record_action("cancel");
        Ok(self.publish(&machine))
    }

    /// Recompute the running timer from the wall clock. Skipped while the
    /// app is in the background; [`handle_lifecycle`](Self::handle_lifecycle)
    /// catches up on foreground.
    pub fn tick(&self) -> Result<Option<TimerSnapshot>, TimerError> {
        if self.in_background.load(Ordering::SeqCst) {
            return Ok(None);
        }

        let mut machine = self.lock()?;
        if !machine.recompute(self.clock.now_ms()) {
            return Ok(None);
        }

        if let Err(e) = self.store.save(TimerStatePatch::elapsed(machine.elapsed_seconds())) {
            warn!("Failed to persist timer tick: {}", e);
        }
        Ok(Some(self.publish(&machine)))
    }

    pub fn handle_lifecycle(&self, event: LifecycleEvent) -> Result<TimerSnapshot, TimerError> {
        match event {
            LifecycleEvent::Background => {
                self.in_background.store(true, Ordering::SeqCst);
                info!("App moved to background");
                let machine = self.lock()?;
                Ok(TimerSnapshot::from_machine(&machine, self.is_saving()))
            }
            LifecycleEvent::Foreground | LifecycleEvent::Wake => {
                if event == LifecycleEvent::Foreground {
                    self.in_background.store(false, Ordering::SeqCst);
                }
                let mut machine = self.lock()?;
                if machine.is_running() {
                    let before = machine.elapsed_seconds();
                    machine.recompute(self.clock.now_ms());
                    info!(
                        "Recomputed after {:?}, elapsed {}s -> {}s",
                        event,
                        before,
                        machine.elapsed_seconds()
                    );
                    self.persist(&machine);
                } else {
                    debug!("{:?} with timer not running", event);
                }
                Ok(self.publish(&machine))
            }
        }
    }

    /// Report a lifecycle transition to the observer task
    pub fn notify_lifecycle(&self, event: LifecycleEvent) {
        if let Err(e) = self.lifecycle_tx.send(event) {
            warn!("No lifecycle observer for {:?}: {}", event, e);
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::SeqCst)
    }

    pub fn is_in_background(&self) -> bool {
        self.in_background.load(Ordering::SeqCst)
    }

    /// Get current timer snapshot
    pub fn snapshot(&self) -> Result<TimerSnapshot, TimerError> {
        let machine = self.lock()?;
        Ok(TimerSnapshot::from_machine(&machine, self.is_saving()))
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        format_elapsed(self.started_at.elapsed().as_secs())
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    fn transition<F>(&self, action: &str, apply: F) -> Result<TimerSnapshot, TimerError>
    where
        F: FnOnce(&mut TimerMachine, i64) -> Result<(), TimerError>,
    {
        let mut machine = self.lock()?;
        // The session being submitted must not change under the request
        self.ensure_not_saving()?;
        apply(&mut machine, self.clock.now_ms())?;
        info!(
            "Timer {}: phase={} elapsed={}s",
            action,
            machine.phase(),
            machine.elapsed_seconds()
        );
        self.persist(&machine);
        self.record_action(action);
        Ok(self.publish(&machine))
    }

    fn ensure_not_saving(&self) -> Result<(), TimerError> {
        if self.is_saving() {
            return Err(TimerError::SaveInProgress);
        }
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, TimerMachine>, TimerError> {
        self.machine.lock().map_err(|_| TimerError::Poisoned)
    }

    fn persist(&self, machine: &TimerMachine) {
        if let Err(e) = self.store.save(machine.snapshot().into()) {
            error!("Failed to persist timer state: {}", e);
        }
    }

    fn publish(&self, machine: &TimerMachine) -> TimerSnapshot {
        let snapshot = TimerSnapshot::from_machine(machine, self.is_saving());
        if let Err(e) = self.timer_update_tx.send(snapshot.clone()) {
            warn!("Failed to send timer update: {}", e);
        }
        snapshot
    }

    fn publish_current(&self) {
        if let Ok(machine) = self.lock() {
            self.publish(&machine);
        }
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }
}
