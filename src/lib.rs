//! Practice Timer - a wall-clock practice timer for MusicOnTheGo
//!
//! This library keeps a practice session's elapsed time correct across
//! process and system suspension, persists it locally and submits finished
//! sessions to the MusicOnTheGo API.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::TimerError;
pub use state::AppState;
pub use utils::signals::shutdown_signal;
