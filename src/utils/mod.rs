//! Utility functions module
//!
//! This module contains clock access, display formatting and signal handling.

pub mod clock;
pub mod format;
pub mod signals;

// Re-export main functions
pub use clock::{Clock, ManualClock, SystemClock};
pub use format::format_elapsed;
pub use signals::{lifecycle_signals, shutdown_signal};
