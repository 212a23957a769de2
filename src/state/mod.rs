//! State management module
//!
//! This module contains the timer record, the elapsed-time calculator, the
//! session state machine and the shared application state.

pub mod app_state;
pub mod elapsed;
pub mod machine;
pub mod timer_state;

// Re-export main types
pub use app_state::{AppState, LifecycleEvent, TimerSnapshot};
pub use elapsed::compute_elapsed;
pub use machine::{Phase, TimerMachine};
pub use timer_state::{TimerState, TimerStatePatch};
