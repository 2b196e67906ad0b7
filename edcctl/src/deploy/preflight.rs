//! Preflight checks before touching the cluster.

use crate::process::{CommandRunner, Invocation};
use anyhow::Result;
use edc_common::{EdcError, ErrorCode};
use serde::Serialize;
use std::path::PathBuf;

/// CRD whose presence means cert-manager is installed.
pub const CERT_MANAGER_CRD: &str = "clusterissuers.cert-manager.io";

/// Result of preflight checks.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreflightResult {
    /// Resolved `kubectl` path.
    pub kubectl: Option<PathBuf>,
    /// Resolved `helm` path.
    pub helm: Option<PathBuf>,
    /// `helm version --short` output.
    pub helm_version: Option<String>,
    /// `kubectl cluster-info` succeeded.
    pub cluster_reachable: bool,
    /// cert-manager CRD present; `None` when not checked.
    pub cert_manager: Option<bool>,
    /// Issues found during preflight.
    pub issues: Vec<PreflightIssue>,
}

impl PreflightResult {
    /// The first error-level issue as a typed error.
    pub fn fatal_error(&self) -> Option<EdcError> {
        self.issues
            .iter()
            .find(|i| i.severity == Severity::Error)
            .map(|i| EdcError::new(i.code, i.message.clone()))
    }

    pub fn warnings(&self) -> impl Iterator<Item = &PreflightIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
}

/// An issue found during preflight checks.
#[derive(Debug, Clone, Serialize)]
pub struct PreflightIssue {
    /// Severity of the issue.
    pub severity: Severity,
    /// Which check found the issue.
    pub check: String,
    /// Catalog code raised when the issue is fatal.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

/// Severity level for issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    /// Warning - may cause problems.
    Warning,
    /// Error - the command cannot proceed.
    Error,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PreflightOptions {
    /// Look for the cert-manager CRD (plain install only).
    pub check_cert_manager: bool,
}

/// Run preflight checks. Only returns `Err` when a runner itself fails;
/// check failures are reported as issues.
pub async fn run_preflight<R: CommandRunner>(
    runner: &R,
    options: PreflightOptions,
) -> Result<PreflightResult> {
    let mut result = PreflightResult {
        kubectl: runner.locate("kubectl"),
        helm: runner.locate("helm"),
        ..Default::default()
    };

    for (program, path) in [("kubectl", &result.kubectl), ("helm", &result.helm)] {
        if path.is_none() {
            result.issues.push(PreflightIssue {
                severity: Severity::Error,
                check: program.to_string(),
                code: ErrorCode::PrereqBinaryMissing,
                message: format!("{program} not found on PATH"),
            });
        }
    }
    if result.issues.iter().any(|i| i.severity == Severity::Error) {
        return Ok(result);
    }

    let helm = runner.run(&Invocation::helm(["version", "--short"])).await?;
    if helm.success() {
        result.helm_version = Some(helm.stdout.trim().to_string());
    } else {
        result.issues.push(PreflightIssue {
            severity: Severity::Warning,
            check: "helm".into(),
            code: ErrorCode::PrereqBinaryMissing,
            message: format!("helm version failed: {}", helm.error_summary()),
        });
    }

    let cluster = runner
        .run(&Invocation::kubectl(["cluster-info", "--request-timeout=10s"]))
        .await?;
    result.cluster_reachable = cluster.success();
    if !result.cluster_reachable {
        result.issues.push(PreflightIssue {
            severity: Severity::Error,
            check: "cluster".into(),
            code: ErrorCode::PrereqClusterUnreachable,
            message: format!("cluster not reachable: {}", cluster.error_summary()),
        });
        return Ok(result);
    }

    if options.check_cert_manager {
        let crd = runner
            .run(&Invocation::kubectl(["get", "crd", CERT_MANAGER_CRD]))
            .await?;
        result.cert_manager = Some(crd.success());
        if !crd.success() {
            result.issues.push(PreflightIssue {
                severity: Severity::Warning,
                check: "cert-manager".into(),
                code: ErrorCode::PrereqCertManagerMissing,
                message: format!(
                    "cert-manager CRD {CERT_MANAGER_CRD} not found; TLS ingress will not be issued"
                ),
            });
        }
    }

    tracing::debug!(
        issues = result.issues.len(),
        cluster_reachable = result.cluster_reachable,
        "Preflight finished"
    );
    Ok(result)
}
