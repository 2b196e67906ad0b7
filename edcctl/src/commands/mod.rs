//! Subcommand implementations.
//!
//! Each module owns its clap `Args` struct and an entry point that
//! `main` dispatches to. Failures that should pick a specific exit code
//! are raised as [`edc_common::EdcError`].

pub mod deploy;
pub mod helpers;
pub mod history;
pub mod status;
pub mod workflow;

pub use deploy::{DeployContext, InstallArgs, TargetArgs, UninstallArgs, UpgradeArgs};
pub use history::HistoryArgs;
pub use status::StatusArgs;
pub use workflow::WorkflowArgs;
