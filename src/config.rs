//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "practice-timer")]
#[command(about = "A wall-clock practice timer that survives suspension")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Base URL of the MusicOnTheGo API
    #[arg(long, env = "PRACTICE_API_URL", default_value = "http://localhost:5050/api")]
    pub api_url: String,

    /// Bearer token for the MusicOnTheGo API
    #[arg(long, env = "PRACTICE_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// File the timer state is persisted to
    #[arg(long, default_value = "practice-timer-state.json")]
    pub state_file: PathBuf,

    /// Seconds between system sleep checks
    #[arg(long, default_value = "15")]
    pub wake_check_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn wake_check_interval(&self) -> Duration {
        Duration::from_secs(self.wake_check_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_locally() {
        let config = Config::try_parse_from(["practice-timer"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.log_level(), "info");
        assert_eq!(config.wake_check_interval(), Duration::from_secs(15));
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "practice-timer",
            "--port",
            "9000",
            "--api-url",
            "https://api.example.com/api",
            "--state-file",
            "/tmp/timer.json",
            "--wake-check-secs",
            "0",
            "-v",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.api_url, "https://api.example.com/api");
        assert_eq!(config.state_file, PathBuf::from("/tmp/timer.json"));
        assert_eq!(config.wake_check_interval(), Duration::from_secs(1));
        assert_eq!(config.log_level(), "debug");
    }
}
