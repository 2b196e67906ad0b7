//! Deployment planning and data structures.
//!
//! A plan is the ordered list of `helm`/`kubectl` invocations a lifecycle
//! command will run. Building it performs no I/O, so the same plan can be
//! printed (dry run), executed, or serialized for `--json`.

use super::manifests::render_cluster_issuer;
use crate::process::Invocation;
use chrono::{DateTime, Utc};
use edc_common::config::{ComponentConfig, StackConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Cap on namespace deletion.
pub const NAMESPACE_DELETE_TIMEOUT: &str = "30s";

/// Lifecycle operation a plan performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Install,
    Upgrade,
    Uninstall,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Install => "install",
            Self::Upgrade => "upgrade",
            Self::Uninstall => "uninstall",
        };
        f.write_str(name)
    }
}

/// The connector release a command targets, after CLI overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTarget {
    pub release: String,
    pub namespace: String,
    pub chart: String,
    pub version: Option<String>,
    pub values: Vec<PathBuf>,
    pub set: BTreeMap<String, String>,
    /// Passed to `helm --timeout`.
    pub timeout: Duration,
}

impl ReleaseTarget {
    /// Start from the stack's connector component.
    pub fn from_stack(stack: &StackConfig, timeout: Duration) -> Self {
        let connector = &stack.connector;
        Self {
            release: connector.name.clone(),
            namespace: connector.namespace.clone(),
            chart: connector.chart.clone(),
            version: connector.version.clone(),
            values: connector.values.clone(),
            set: connector.set.clone(),
            timeout,
        }
    }
}

/// A complete deployment plan.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentPlan {
    /// Unique identifier for this run.
    pub id: Uuid,
    /// When the plan was created.
    pub created_at: DateTime<Utc>,
    pub operation: Operation,
    pub release: String,
    pub namespace: String,
    pub steps: Vec<DeployStep>,
}

impl DeploymentPlan {
    fn new(operation: Operation, target: &ReleaseTarget) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            operation,
            release: target.release.clone(),
            namespace: target.namespace.clone(),
            steps: Vec::new(),
        }
    }

    fn push(&mut self, name: impl Into<String>, invocation: Invocation) {
        self.steps.push(DeployStep::new(name, invocation));
    }

    /// Steps that have not run.
    pub fn pending(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Pending)
            .count()
    }
}

/// A single step in the plan.
#[derive(Debug, Clone, Serialize)]
pub struct DeployStep {
    /// Step name, e.g. `repo-add:bitnami` or `connector:edc`.
    pub name: String,
    /// Masked, shell-escaped command line.
    pub command: String,
    #[serde(skip)]
    pub invocation: Invocation,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Step output or error message.
    pub output: Option<String>,
}

impl DeployStep {
    pub fn new(name: impl Into<String>, invocation: Invocation) -> Self {
        Self {
            name: name.into(),
            command: invocation.display(),
            invocation,
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            output: None,
        }
    }

    /// Mark step as in progress.
    pub fn start(&mut self) {
        self.status = StepStatus::InProgress;
        self.started_at = Some(Utc::now());
    }

    /// Mark step as completed.
    pub fn complete(&mut self, output: Option<String>) {
        self.status = StepStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.output = output;
    }

    /// Mark step as failed.
    pub fn fail(&mut self, error: String) {
        self.status = StepStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.output = Some(error);
    }

    /// Mark step as skipped (dry run).
    pub fn skip(&mut self) {
        self.status = StepStatus::Skipped;
    }
}

/// Status of a deployment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    /// Not yet started.
    Pending,
    /// Currently running.
    InProgress,
    /// Successfully completed.
    Completed,
    /// Failed with error.
    Failed,
    /// Skipped.
    Skipped,
}

fn helm_timeout(timeout: Duration) -> String {
    format!("{}s", timeout.as_secs().max(1))
}

fn chart_args(
    args: &mut Vec<String>,
    version: Option<&str>,
    values: &[PathBuf],
    set: &BTreeMap<String, String>,
) {
    if let Some(version) = version {
        args.extend(["--version".to_string(), version.to_string()]);
    }
    for file in values {
        args.extend(["-f".to_string(), file.display().to_string()]);
    }
    for (key, value) in set {
        args.extend(["--set".to_string(), format!("{key}={value}")]);
    }
}

fn repo_steps<'a>(
    plan: &mut DeploymentPlan,
    stack: &'a StackConfig,
    components: impl IntoIterator<Item = &'a ComponentConfig>,
) {
    for (name, url) in stack.repositories(components) {
        plan.push(
            format!("repo-add:{name}"),
            Invocation::helm(["repo", "add", name, url, "--force-update"]),
        );
    }
    plan.push("repo-update", Invocation::helm(["repo", "update"]));
}

fn infra_install(component: &ComponentConfig, timeout: Duration) -> Invocation {
    let mut args: Vec<String> = [
        "upgrade",
        "--install",
        component.name.as_str(),
        component.chart.as_str(),
        "--namespace",
        component.namespace.as_str(),
        "--create-namespace",
        "--wait",
        "--timeout",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.push(helm_timeout(timeout));
    chart_args(
        &mut args,
        component.version.as_deref(),
        &component.values,
        &component.set,
    );
    Invocation::helm(args)
}

/// `install [--with-infra]`.
///
/// With infra, supporting charts go first in stack order and the
/// ClusterIssuer is applied right after cert-manager (only when an ACME
/// email is configured). The connector is always last.
pub fn install_plan(stack: &StackConfig, target: &ReleaseTarget, with_infra: bool) -> DeploymentPlan {
    let mut plan = DeploymentPlan::new(Operation::Install, target);

    if with_infra {
        repo_steps(
            &mut plan,
            stack,
            stack.infra.iter().chain(std::iter::once(&stack.connector)),
        );
        for component in &stack.infra {
            plan.push(
                format!("infra:{}", component.name),
                infra_install(component, target.timeout),
            );
            if component.name == "cert-manager" && stack.cluster_issuer.email.is_some() {
                plan.push(
                    "cluster-issuer",
                    Invocation::kubectl(["apply", "-f", "-"])
                        .with_stdin(render_cluster_issuer(&stack.cluster_issuer)),
                );
            }
        }
    } else {
        repo_steps(&mut plan, stack, std::iter::once(&stack.connector));
    }

    let mut args: Vec<String> = vec![
        "install".into(),
        target.release.clone(),
        target.chart.clone(),
        "--namespace".into(),
        target.namespace.clone(),
        "--create-namespace".into(),
        "--wait".into(),
        "--timeout".into(),
        helm_timeout(target.timeout),
    ];
    chart_args(&mut args, target.version.as_deref(), &target.values, &target.set);
    plan.push(format!("connector:{}", target.release), Invocation::helm(args));

    plan
}

/// `upgrade`. Without values files the release keeps its current values.
pub fn upgrade_plan(stack: &StackConfig, target: &ReleaseTarget) -> DeploymentPlan {
    let mut plan = DeploymentPlan::new(Operation::Upgrade, target);
    repo_steps(&mut plan, stack, std::iter::once(&stack.connector));

    let mut args: Vec<String> = vec![
        "upgrade".into(),
        target.release.clone(),
        target.chart.clone(),
        "--namespace".into(),
        target.namespace.clone(),
        "--wait".into(),
        "--timeout".into(),
        helm_timeout(target.timeout),
    ];
    if target.values.is_empty() {
        args.push("--reuse-values".into());
    }
    chart_args(&mut args, target.version.as_deref(), &target.values, &target.set);
    plan.push(format!("connector:{}", target.release), Invocation::helm(args));

    plan
}

/// `uninstall [--with-infra] [--delete-namespace]`.
///
/// Infra is removed in reverse install order after the connector.
pub fn uninstall_plan(
    stack: &StackConfig,
    target: &ReleaseTarget,
    with_infra: bool,
    delete_namespace: bool,
) -> DeploymentPlan {
    let mut plan = DeploymentPlan::new(Operation::Uninstall, target);

    plan.push(
        format!("connector:{}", target.release),
        Invocation::helm([
            "uninstall",
            target.release.as_str(),
            "--namespace",
            target.namespace.as_str(),
            "--wait",
        ]),
    );

    if with_infra {
        plan.push(
            "cluster-issuer",
            Invocation::kubectl([
                "delete",
                "clusterissuer",
                stack.cluster_issuer.name.as_str(),
                "--ignore-not-found",
            ]),
        );
        for component in stack.infra.iter().rev() {
            plan.push(
                format!("infra:{}", component.name),
                Invocation::helm([
                    "uninstall",
                    component.name.as_str(),
                    "--namespace",
                    component.namespace.as_str(),
                    "--wait",
                    "--ignore-not-found",
                ]),
            );
        }
    }

    if delete_namespace {
        plan.push(
            format!("namespace:{}", target.namespace),
            Invocation::kubectl([
                "delete".to_string(),
                "namespace".to_string(),
                target.namespace.clone(),
                "--ignore-not-found".to_string(),
                format!("--timeout={NAMESPACE_DELETE_TIMEOUT}"),
            ]),
        );
    }

    plan
}
