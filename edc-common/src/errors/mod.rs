//! Error catalog and the typed error carried through command code.
//!
//! Command code works with `anyhow::Result`; whenever a failure should end
//! the process with a specific exit code it is raised as an [`EdcError`],
//! which the binary downcasts to pick the exit code and print remediation.

pub mod catalog;

pub use catalog::{ErrorCategory, ErrorCode, ErrorEntry};

use thiserror::Error;

/// A catalogued failure with call-site detail.
#[derive(Debug, Error)]
#[error("{detail}")]
pub struct EdcError {
    /// Catalog entry.
    pub code: ErrorCode,
    /// What went wrong at the call site.
    pub detail: String,
}

impl EdcError {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    /// Exit code for the process.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        self.code.exit_code()
    }

    /// One-line rendering: `[EDC-E003] Required ...: <detail>`.
    #[must_use]
    pub fn format_brief(&self) -> String {
        format!("{}: {}", self.code.entry().format_brief(), self.detail)
    }

    /// Multi-line rendering with remediation steps.
    #[must_use]
    pub fn format_full(&self) -> String {
        let entry = self.code.entry();
        let mut output = format!("[{}] {}\n  {}\n", entry.code, entry.message, self.detail);
        if !entry.remediation.is_empty() {
            output.push_str("\nRemediation steps:\n");
            for (i, step) in entry.remediation.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, step));
            }
        }
        output
    }
}

impl From<std::io::Error> for EdcError {
    fn from(err: std::io::Error) -> Self {
        Self::new(ErrorCode::InternalIo, err.to_string())
    }
}

impl From<serde_json::Error> for EdcError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(ErrorCode::InternalSerde, err.to_string())
    }
}
