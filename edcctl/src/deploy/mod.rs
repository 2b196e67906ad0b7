//! Deployment lifecycle for the connector stack.
//!
//! Provides:
//! - Preflight checks for `helm`, `kubectl` and cluster reachability
//! - Plans of ordered `helm`/`kubectl` steps
//! - Sequential execution with dry-run support
//! - Pre-change backups of release values and manifests
//! - Deployment history

pub mod backup;
pub mod executor;
pub mod history;
pub mod manifests;
pub mod plan;
pub mod preflight;

pub use backup::{BackupManager, ReleaseBackup};
pub use executor::{PlanExecutor, PlanOutcome};
pub use history::{DeploymentHistoryEntry, HistoryManager};
pub use plan::{
    DeployStep, DeploymentPlan, Operation, ReleaseTarget, StepStatus, install_plan,
    uninstall_plan, upgrade_plan,
};
pub use preflight::{PreflightIssue, PreflightOptions, PreflightResult, Severity, run_preflight};

use edc_common::{EdcError, ErrorCode};

/// Helm release names are limited to 53 characters.
pub const MAX_RELEASE_LEN: usize = 53;
/// Namespace names are limited to 63 characters.
pub const MAX_NAMESPACE_LEN: usize = 63;

/// Check a release or namespace name against the DNS-1123 label rules.
pub fn validate_name(kind: &str, name: &str, max_len: usize) -> Result<(), EdcError> {
    let invalid = |reason: &str| {
        Err(EdcError::new(
            ErrorCode::UsageInvalidArgument,
            format!("invalid {kind} '{name}': {reason}"),
        ))
    };

    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name.len() > max_len {
        return invalid(&format!("must be at most {max_len} characters"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return invalid("only lowercase letters, digits and '-' are allowed");
    }
    if name.starts_with('-') || name.ends_with('-') {
        return invalid("must start and end with a letter or digit");
    }
    Ok(())
}

/// Validate both names of a target.
pub fn validate_target(target: &ReleaseTarget) -> Result<(), EdcError> {
    validate_name("release", &target.release, MAX_RELEASE_LEN)?;
    validate_name("namespace", &target.namespace, MAX_NAMESPACE_LEN)
}
