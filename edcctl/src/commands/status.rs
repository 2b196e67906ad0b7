//! `edcctl status`: release state, pods and the last successful run.

use super::deploy::TargetArgs;
use super::helpers::{
    TargetOverrides, humanize_millis, load_stack, release_lookup_failed, release_not_found,
    resolve_target,
};
use crate::deploy::{DeploymentHistoryEntry, HistoryManager, validate_target};
use crate::process::{CommandRunner, Invocation};
use crate::ui::Output;
use anyhow::Result;
use clap::Args;
use edc_common::{EdcError, ErrorCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Stack configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReleaseStatus {
    pub release: String,
    pub namespace: String,
    pub status: String,
    pub revision: u64,
    pub chart: Option<String>,
    pub app_version: Option<String>,
    pub last_deployed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default, PartialEq, Eq)]
pub struct PodSummary {
    pub total: usize,
    pub ready: usize,
    /// Pod count per phase (`Running`, `Pending`, ...).
    pub phases: BTreeMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub release: ReleaseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pods: Option<PodSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful: Option<DeploymentHistoryEntry>,
}

/// Parse `helm status -o json`.
pub fn parse_release_status(raw: &str) -> Result<ReleaseStatus> {
    let value: Value = serde_json::from_str(raw).map_err(|err| {
        EdcError::new(
            ErrorCode::InternalSerde,
            format!("helm status output is not JSON: {err}"),
        )
    })?;
    let text = |pointer: &str| {
        value
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let chart = match (text("/chart/metadata/name"), text("/chart/metadata/version")) {
        (Some(name), Some(version)) => Some(format!("{name}-{version}")),
        (name, _) => name,
    };

    Ok(ReleaseStatus {
        release: text("/name").unwrap_or_default(),
        namespace: text("/namespace").unwrap_or_default(),
        status: text("/info/status").unwrap_or_else(|| "unknown".to_string()),
        revision: value.get("version").and_then(Value::as_u64).unwrap_or(0),
        chart,
        app_version: text("/chart/metadata/appVersion"),
        last_deployed: text("/info/last_deployed"),
    })
}

/// Parse `kubectl get pods -o json`.
pub fn summarize_pods(raw: &str) -> Result<PodSummary> {
    let value: Value = serde_json::from_str(raw).map_err(|err| {
        EdcError::new(
            ErrorCode::InternalSerde,
            format!("kubectl output is not JSON: {err}"),
        )
    })?;
    let mut summary = PodSummary::default();
    let items = value
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for pod in items {
        summary.total += 1;
        let phase = pod
            .pointer("/status/phase")
            .and_then(Value::as_str)
            .unwrap_or("Unknown");
        *summary.phases.entry(phase.to_string()).or_default() += 1;

        let ready = pod
            .pointer("/status/containerStatuses")
            .and_then(Value::as_array)
            .is_some_and(|containers| {
                !containers.is_empty()
                    && containers
                        .iter()
                        .all(|c| c.get("ready").and_then(Value::as_bool) == Some(true))
            });
        if ready {
            summary.ready += 1;
        }
    }
    Ok(summary)
}

pub async fn status<R: CommandRunner>(
    runner: &R,
    output: &Output,
    history: &HistoryManager,
    config_path: Option<PathBuf>,
    args: StatusArgs,
) -> Result<()> {
    let stack = load_stack(args.config.as_deref().or(config_path.as_deref()))?;
    let target = resolve_target(
        &stack,
        TargetOverrides {
            release: args.target.release.as_deref(),
            namespace: args.target.namespace.as_deref(),
            ..Default::default()
        },
        Duration::from_secs(0),
    );
    validate_target(&target)?;

    let helm = runner
        .run(&Invocation::helm([
            "status",
            target.release.as_str(),
            "--namespace",
            target.namespace.as_str(),
            "-o",
            "json",
        ]))
        .await?;
    if !helm.success() {
        if !release_not_found(&helm) {
            return Err(release_lookup_failed(&target, &helm));
        }
        return Err(EdcError::new(
            ErrorCode::DeployReleaseNotFound,
            format!(
                "release '{}' not found in namespace '{}': {}",
                target.release,
                target.namespace,
                helm.error_summary()
            ),
        )
        .into());
    }
    let release = parse_release_status(&helm.stdout)?;

    let selector = format!("app.kubernetes.io/instance={}", target.release);
    let pods = runner
        .run(&Invocation::kubectl([
            "get",
            "pods",
            "--namespace",
            target.namespace.as_str(),
            "-l",
            selector.as_str(),
            "-o",
            "json",
        ]))
        .await?;
    let pods = if pods.success() {
        Some(summarize_pods(&pods.stdout)?)
    } else {
        output.warn(&format!("could not list pods: {}", pods.error_summary()));
        None
    };

    let last_successful = history.last_successful(&target.release)?;
    let report = StatusReport {
        release,
        pods,
        last_successful,
    };

    if output.is_json() {
        return output.json(&report);
    }
    print_report(output, &report);
    Ok(())
}

fn print_report(output: &Output, report: &StatusReport) {
    let release = &report.release;
    output.header(&format!("{} ({})", release.release, release.namespace));
    output.info(&format!("status:   {}", release.status));
    output.info(&format!("revision: {}", release.revision));
    if let Some(chart) = &release.chart {
        output.info(&format!("chart:    {chart}"));
    }
    if let Some(app_version) = &release.app_version {
        output.info(&format!("app:      {app_version}"));
    }
    if let Some(deployed) = &release.last_deployed {
        output.info(&format!("deployed: {deployed}"));
    }

    if let Some(pods) = &report.pods {
        let phases = pods
            .phases
            .iter()
            .map(|(phase, count)| format!("{count} {phase}"))
            .collect::<Vec<_>>()
            .join(", ");
        let line = format!("pods:     {}/{} ready ({phases})", pods.ready, pods.total);
        if pods.total > 0 && pods.ready == pods.total {
            output.success(&line);
        } else {
            output.warn(&line);
        }
    }

    if let Some(entry) = &report.last_successful {
        output.info(&format!(
            "last successful {} at {} ({})",
            entry.operation,
            entry.timestamp,
            humanize_millis(entry.duration_ms)
        ));
    }
}
