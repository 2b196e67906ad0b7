//! Shared types and utilities for edcctl.
//!
//! Holds everything the CLI needs that is not tied to a particular
//! subcommand: configuration loading, the error catalog, logging setup,
//! secret masking and the derivation of provider resource identifiers.

pub mod config;
pub mod errors;
pub mod logging;
pub mod types;
pub mod util;

pub use config::{
    ConfigSource, EnvError, EnvFile, EnvParser, Settings, Sourced, StackConfig, WorkflowConfig,
};
pub use errors::{EdcError, ErrorCategory, ErrorCode, ErrorEntry};
pub use logging::{LogConfig, LogFormat, init_logging};
pub use types::ResourceIds;
pub use util::{is_sensitive_key, mask_sensitive, redact};
