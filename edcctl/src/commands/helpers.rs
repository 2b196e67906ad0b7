//! Shared helper functions for edcctl commands.

use crate::deploy::{PreflightResult, ReleaseTarget};
use crate::process::{CommandOutput, CommandRunner, Invocation};
use crate::ui::Output;
use anyhow::Result;
use edc_common::config::StackConfigError;
use edc_common::{EdcError, ErrorCode, StackConfig};
use std::path::Path;

/// Indent each line of text with a given prefix.
pub fn indent_lines(text: &str, prefix: &str) -> String {
    let mut out = String::new();
    for (idx, line) in text.lines().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(prefix);
        out.push_str(line);
    }
    out
}

/// Format a duration in milliseconds as a human-readable string.
pub fn humanize_millis(ms: u64) -> String {
    let secs = ms / 1000;
    if secs == 0 {
        format!("{ms}ms")
    } else if secs < 60 {
        format!("{}.{}s", secs, (ms % 1000) / 100)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Load the stack configuration, mapping failures onto catalog codes.
pub fn load_stack(path: Option<&Path>) -> Result<StackConfig> {
    let (stack, source) = StackConfig::load(path).map_err(|err| {
        let code = match &err {
            StackConfigError::NotFound { .. } => ErrorCode::ConfigStackNotFound,
            StackConfigError::Io { .. } => ErrorCode::InternalIo,
            StackConfigError::Parse { .. } => ErrorCode::ConfigStackParseError,
            StackConfigError::Invalid(_) => ErrorCode::ConfigStackInvalid,
        };
        EdcError::new(code, err.to_string())
    })?;
    tracing::debug!(%source, "Stack configuration resolved");
    Ok(stack)
}

/// Overrides shared by install and upgrade.
#[derive(Debug, Default, Clone)]
pub struct TargetOverrides<'a> {
    pub release: Option<&'a str>,
    pub namespace: Option<&'a str>,
    pub chart: Option<&'a str>,
    pub version: Option<&'a str>,
    pub values: &'a [std::path::PathBuf],
}

/// Connector target from the stack, with CLI flags applied on top.
pub fn resolve_target(
    stack: &StackConfig,
    overrides: TargetOverrides<'_>,
    timeout: std::time::Duration,
) -> ReleaseTarget {
    let mut target = ReleaseTarget::from_stack(stack, timeout);
    if let Some(release) = overrides.release {
        target.release = release.to_string();
    }
    if let Some(namespace) = overrides.namespace {
        target.namespace = namespace.to_string();
    }
    if let Some(chart) = overrides.chart {
        target.chart = chart.to_string();
    }
    if let Some(version) = overrides.version {
        target.version = Some(version.to_string());
    }
    if !overrides.values.is_empty() {
        target.values = overrides.values.to_vec();
    }
    target
}

/// Whether a failed `helm status` reported the release as missing.
pub fn release_not_found(output: &CommandOutput) -> bool {
    output.stderr.to_ascii_lowercase().contains("not found")
}

/// Any other `helm status` failure, such as RBAC denial or an unreachable
/// context.
pub fn release_lookup_failed(target: &ReleaseTarget, output: &CommandOutput) -> anyhow::Error {
    EdcError::new(
        ErrorCode::DeployStepFailed,
        format!(
            "helm status {} --namespace {} failed: {}",
            target.release,
            target.namespace,
            output.error_summary()
        ),
    )
    .into()
}

/// `helm status` succeeds for an existing release and reports "not found"
/// for a missing one. Other failures are errors.
pub async fn release_exists<R: CommandRunner>(runner: &R, target: &ReleaseTarget) -> Result<bool> {
    let output = runner
        .run(&Invocation::helm([
            "status",
            target.release.as_str(),
            "--namespace",
            target.namespace.as_str(),
        ]))
        .await?;
    if output.success() {
        return Ok(true);
    }
    if release_not_found(&output) {
        return Ok(false);
    }
    Err(release_lookup_failed(target, &output))
}

/// Print warnings and fail on the first error-level issue.
pub fn enforce_preflight(output: &Output, preflight: &PreflightResult) -> Result<()> {
    for warning in preflight.warnings() {
        output.warn(&warning.message);
    }
    if let Some(err) = preflight.fatal_error() {
        return Err(err.into());
    }
    if let Some(version) = &preflight.helm_version {
        output.info(&format!("helm {version}"));
    }
    Ok(())
}
