//! External collaborators module
//!
//! This module contains the local key-value persistence and the client for
//! the remote practice API.

pub mod practice_api;
pub mod storage;

// Re-export main types
pub use practice_api::{HttpPracticeApi, PracticeApi, PracticeSessionRequest, PracticeStats};
pub use storage::{FileStore, KeyValueStore, MemoryStore, TimerStore, TIMER_STATE_KEY};
