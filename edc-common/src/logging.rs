//! Tracing subscriber setup.
//!
//! Diagnostics always go to stderr so that stdout carries only command
//! output (the fetched data body, `--json` documents).

use crate::config::Settings;
use crate::errors::{EdcError, ErrorCode};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LogConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            level: settings.log_level.value.clone(),
            format: LogFormat::parse(&settings.log_format.value).unwrap_or_default(),
        }
    }

    /// Raise the level to `debug` when requested by `-v` or `DEBUG=true`.
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug {
            self.level = "debug".to_string();
        }
        self
    }

    fn filter(&self) -> EnvFilter {
        // RUST_LOG wins when set, mirroring the usual tracing convention.
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(format!("warn,edcctl={0},edc_common={0}", self.level)))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(config.filter());

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|err| EdcError::new(ErrorCode::InternalLogging, err.to_string()).into())
}
