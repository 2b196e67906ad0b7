//! Process-wide settings read from `EDCCTL_` variables.

use super::env::{EnvError, EnvParser};
use super::source::Sourced;
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between negotiation polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Default number of negotiation polls.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 20;
/// Default per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Ambient settings shared by all subcommands.
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_level: Sourced<String>,
    pub log_format: Sourced<String>,
    pub http_timeout: Sourced<Duration>,
    pub poll_interval: Sourced<Duration>,
    pub poll_attempts: Sourced<u32>,
    pub backup_dir: Sourced<Option<PathBuf>>,
    pub config_path: Sourced<Option<PathBuf>>,
}

impl Settings {
    /// Read settings from the environment, collecting every problem.
    pub fn from_env() -> (Self, Vec<EnvError>) {
        let mut parser = EnvParser::new();

        let log_level = parser.get_log_level("LOG_LEVEL", "info");
        let log_format = parser.get_choice("LOG_FORMAT", "pretty", &["pretty", "text", "json"]);
        let http_timeout = as_duration(
            parser.get_u64_range("HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT.as_secs(), 1, 600),
            Duration::from_secs,
        );
        let poll_interval = as_duration(
            parser.get_u64_range(
                "POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL.as_millis() as u64,
                1,
                300_000,
            ),
            Duration::from_millis,
        );
        let poll_attempts = parser.get_u32_range("POLL_ATTEMPTS", DEFAULT_POLL_ATTEMPTS, 1, 1000);
        let backup_dir = parser.get_optional_path("BACKUP_DIR");
        let config_path = parser.get_optional_path("CONFIG");

        let settings = Self {
            log_level,
            log_format,
            http_timeout,
            poll_interval,
            poll_attempts,
            backup_dir,
            config_path,
        };
        (settings, parser.take_errors())
    }
}

fn as_duration(raw: Sourced<u64>, to_duration: fn(u64) -> Duration) -> Sourced<Duration> {
    Sourced {
        value: to_duration(raw.value),
        source: raw.source,
        env_var: raw.env_var,
    }
}
