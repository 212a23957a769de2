#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

use futures::future::BoxFuture;
use tokio::sync::Notify;
use practice_timer::{
    error::{ApiError, StoreError},
    services::{
        KeyValueStore, MemoryStore, PracticeApi, PracticeSessionRequest, PracticeStats, TimerStore,
    },
    state::{AppState, TimerState},
    utils::{Clock, ManualClock},
};

pub const T0: i64 = 1_760_000_000_000;

/// Practice API double that records what it was sent
#[derive(Default)]
pub struct FakeApi {
    pub weekly_goal: Mutex<Option<u32>>,
    pub fail_with: Mutex<Option<String>>,
    pub stats_calls: AtomicUsize,
    pub sessions: Mutex<Vec<PracticeSessionRequest>>,
    pub fail_stats: AtomicBool,
    /// When set, submissions wait for a notification before completing
    pub save_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    pub fn with_goal(goal: Option<u32>) -> Self {
        Self {
            weekly_goal: Mutex::new(goal),
            ..Self::default()
        }
    }

    pub fn fail_next_saves(&self, message: &str) {
        *self.fail_with.lock().unwrap() = Some(message.to_string());
    }

    pub fn recover(&self) {
        *self.fail_with.lock().unwrap() = None;
    }

    pub fn sessions(&self) -> Vec<PracticeSessionRequest> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::SeqCst)
    }
}

impl PracticeApi for FakeApi {
    fn fetch_stats(&self) -> BoxFuture<'_, Result<PracticeStats, ApiError>> {
        Box::pin(async move {
            self.stats_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_stats.load(Ordering::SeqCst) {
                return Err(ApiError::Server {
                    status: 401,
                    message: "Unauthorized".to_string(),
                });
            }
            Ok(PracticeStats {
                weekly_goal: *self.weekly_goal.lock().unwrap(),
            })
        })
    }

    fn submit_session(
        &self,
        session: PracticeSessionRequest,
    ) -> BoxFuture<'_, Result<serde_json::Value, ApiError>> {
        Box::pin(async move {
            let gate = self.save_gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let failure = self.fail_with.lock().unwrap().clone();
            if let Some(message) = failure {
                return Err(ApiError::Server { status: 500, message });
            }
            self.sessions.lock().unwrap().push(session);
            Ok(serde_json::json!({ "_id": "session-1" }))
        })
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub api: Arc<FakeApi>,
    pub clock: Arc<ManualClock>,
    pub backend: Arc<MemoryStore>,
}

/// Key-value store handle shared between the harness and the timer
pub struct SharedStore(pub Arc<MemoryStore>);

impl KeyValueStore for SharedStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.0.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.0.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.0.remove(key)
    }
}

impl Harness {
    pub fn new(goal: Option<u32>) -> Self {
        Self::with_backend(goal, Arc::new(MemoryStore::new()), T0)
    }

    pub fn with_backend(goal: Option<u32>, backend: Arc<MemoryStore>, now_ms: i64) -> Self {
        let api = Arc::new(FakeApi::with_goal(goal));
        let clock = Arc::new(ManualClock::new(now_ms));
        let store = TimerStore::new(SharedStore(Arc::clone(&backend)));
        let state = Arc::new(AppState::new(
            store,
            Arc::clone(&api) as Arc<dyn PracticeApi>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        ));

        Self {
            state,
            api,
            clock,
            backend,
        }
    }

    pub fn persisted(&self) -> Option<TimerState> {
        TimerStore::new(SharedStore(Arc::clone(&self.backend)))
            .load()
            .unwrap()
    }
}
