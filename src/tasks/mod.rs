//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod lifecycle_observer;
pub mod suspend_detector;
pub mod ticker;

// Re-export main functions
pub use lifecycle_observer::lifecycle_observer_task;
pub use suspend_detector::{suspend_detector_task, SuspendDetector};
pub use ticker::ticker_task;
