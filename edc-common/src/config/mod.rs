//! Configuration system for edcctl.
//!
//! - `EDCCTL_` environment variables with type safety and source tracking
//! - `.env` files for the DSP workflow
//! - TOML stack configuration for the deployment commands

pub mod dotenv;
pub mod env;
pub mod settings;
pub mod source;
pub mod stack;
pub mod workflow;

pub use dotenv::{DotenvError, EnvFile};
pub use env::{EnvError, EnvParser};
pub use settings::Settings;
pub use source::{ConfigSource, Sourced};
pub use stack::{ClusterIssuerConfig, ComponentConfig, StackConfig, StackConfigError};
pub use workflow::WorkflowConfig;

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
