//! `install`, `upgrade` and `uninstall`.
//!
//! Each command validates names, runs preflight, builds a plan, and hands
//! it to the executor. Every executed plan (dry runs included) is recorded
//! in the deployment history.

use super::helpers::{
    TargetOverrides, enforce_preflight, indent_lines, load_stack, release_exists, resolve_target,
};
use crate::deploy::{
    BackupManager, DeploymentHistoryEntry, DeploymentPlan, HistoryManager, PlanExecutor, PlanOutcome,
    PreflightOptions, ReleaseTarget, StepStatus, install_plan, run_preflight, uninstall_plan,
    upgrade_plan, validate_target,
};
use crate::process::CommandRunner;
use crate::ui::{self, Output};
use anyhow::Result;
use chrono::Utc;
use clap::Args;
use edc_common::{EdcError, ErrorCode};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Everything the lifecycle commands need besides their arguments.
pub struct DeployContext<R> {
    pub runner: R,
    pub output: Output,
    pub history: HistoryManager,
    /// Backup root when neither `--backup-dir` nor `EDCCTL_BACKUP_DIR` is set.
    pub backup_root: PathBuf,
    /// Stack file from `EDCCTL_CONFIG`; `--config` wins over it.
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    /// Kubernetes namespace [default: edc]
    #[arg(short = 'n', long)]
    pub namespace: Option<String>,

    /// Helm release name [default: edc]
    #[arg(short = 'r', long)]
    pub release: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct InstallArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Values file for the connector chart (repeatable)
    #[arg(short = 'f', long = "values")]
    pub values: Vec<PathBuf>,

    /// Also install ingress-nginx, cert-manager, Vault and PostgreSQL
    #[arg(long)]
    pub with_infra: bool,

    /// Connector chart reference [default: tractusx-edc/tractusx-connector]
    #[arg(long)]
    pub chart: Option<String>,

    /// Connector chart version
    #[arg(long)]
    pub version: Option<String>,

    /// Stack configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print mutating commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Helm wait timeout per release
    #[arg(long, default_value = "10m", value_parser = humantime::parse_duration)]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Args)]
pub struct UpgradeArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Values file for the connector chart (repeatable). Without it the
    /// release keeps its current values.
    #[arg(short = 'f', long = "values")]
    pub values: Vec<PathBuf>,

    /// Connector chart reference
    #[arg(long)]
    pub chart: Option<String>,

    /// Connector chart version
    #[arg(long)]
    pub version: Option<String>,

    /// Stack configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the pre-upgrade backup
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Skip the pre-upgrade backup
    #[arg(long)]
    pub no_backup: bool,

    /// Print mutating commands instead of running them
    #[arg(long)]
    pub dry_run: bool,

    /// Helm wait timeout
    #[arg(long, default_value = "10m", value_parser = humantime::parse_duration)]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Args)]
pub struct UninstallArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Also remove the infrastructure releases and the ClusterIssuer
    #[arg(long)]
    pub with_infra: bool,

    /// Delete the namespace afterwards
    #[arg(long)]
    pub delete_namespace: bool,

    /// Stack configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for the pre-uninstall backup
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Skip the pre-uninstall backup
    #[arg(long)]
    pub no_backup: bool,

    /// Do not ask for confirmation
    #[arg(long)]
    pub force: bool,

    /// Print mutating commands instead of running them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
struct PlanReport<'a> {
    plan: &'a DeploymentPlan,
    outcome: &'a PlanOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    backup: Option<&'a PathBuf>,
}

pub async fn install<R: CommandRunner>(ctx: &DeployContext<R>, args: InstallArgs) -> Result<()> {
    let out = &ctx.output;
    let stack = load_stack(args.config.as_deref().or(ctx.config_path.as_deref()))?;
    let target = resolve_target(
        &stack,
        TargetOverrides {
            release: args.target.release.as_deref(),
            namespace: args.target.namespace.as_deref(),
            chart: args.chart.as_deref(),
            version: args.version.as_deref(),
            values: &args.values,
        },
        args.timeout,
    );
    validate_target(&target)?;
    header(out, "Install", &target, args.dry_run);

    let preflight = run_preflight(
        &ctx.runner,
        PreflightOptions {
            check_cert_manager: !args.with_infra,
        },
    )
    .await?;
    enforce_preflight(out, &preflight)?;

    if release_exists(&ctx.runner, &target).await? {
        return Err(EdcError::new(
            ErrorCode::DeployReleaseExists,
            format!(
                "release '{}' already exists in namespace '{}'",
                target.release, target.namespace
            ),
        )
        .into());
    }
    if args.with_infra && stack.cluster_issuer.email.is_none() {
        out.warn("cluster_issuer.email is not set; the ClusterIssuer will not be created");
    }

    let plan = install_plan(&stack, &target, args.with_infra);
    run_plan(ctx, plan, args.dry_run, None).await
}

pub async fn upgrade<R: CommandRunner>(ctx: &DeployContext<R>, args: UpgradeArgs) -> Result<()> {
    let out = &ctx.output;
    let stack = load_stack(args.config.as_deref().or(ctx.config_path.as_deref()))?;
    let target = resolve_target(
        &stack,
        TargetOverrides {
            release: args.target.release.as_deref(),
            namespace: args.target.namespace.as_deref(),
            chart: args.chart.as_deref(),
            version: args.version.as_deref(),
            values: &args.values,
        },
        args.timeout,
    );
    validate_target(&target)?;
    header(out, "Upgrade", &target, args.dry_run);

    let preflight = run_preflight(&ctx.runner, PreflightOptions::default()).await?;
    enforce_preflight(out, &preflight)?;
    require_release(ctx, &target).await?;

    let backup = backup(ctx, &target, args.backup_dir, args.no_backup, args.dry_run).await?;
    let plan = upgrade_plan(&stack, &target);
    run_plan(ctx, plan, args.dry_run, backup).await
}

pub async fn uninstall<R: CommandRunner>(
    ctx: &DeployContext<R>,
    args: UninstallArgs,
) -> Result<()> {
    let out = &ctx.output;
    let stack = load_stack(args.config.as_deref().or(ctx.config_path.as_deref()))?;
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

    if !args.force && !args.dry_run {
        let mut prompt = format!(
            "Uninstall release '{}' from namespace '{}'",
            target.release, target.namespace
        );
        if args.with_infra {
            prompt.push_str(" together with the infrastructure releases");
        }
        if args.delete_namespace {
            prompt.push_str(" and delete the namespace");
        }
        prompt.push('?');
        if !ui::confirm(&prompt) {
            return Err(EdcError::new(ErrorCode::UsageCancelled, "uninstall not confirmed").into());
        }
    }
    header(out, "Uninstall", &target, args.dry_run);

    let preflight = run_preflight(&ctx.runner, PreflightOptions::default()).await?;
    enforce_preflight(out, &preflight)?;
    require_release(ctx, &target).await?;

    let backup = backup(ctx, &target, args.backup_dir, args.no_backup, args.dry_run).await?;
    let plan = uninstall_plan(&stack, &target, args.with_infra, args.delete_namespace);
    run_plan(ctx, plan, args.dry_run, backup).await
}

fn header(out: &Output, action: &str, target: &ReleaseTarget, dry_run: bool) {
    out.header(&format!(
        "{action} {} in namespace {}",
        target.release, target.namespace
    ));
    if dry_run {
        out.warn("DRY RUN - no changes will be made");
    }
}

async fn require_release<R: CommandRunner>(ctx: &DeployContext<R>, target: &ReleaseTarget) -> Result<()> {
    if release_exists(&ctx.runner, target).await? {
        return Ok(());
    }
    Err(EdcError::new(
        ErrorCode::DeployReleaseNotFound,
        format!(
            "release '{}' not found in namespace '{}'",
            target.release, target.namespace
        ),
    )
    .into())
}

/// Take the pre-change backup. Returns the backup directory, or the
/// directory that would be used in a dry run.
async fn backup<R: CommandRunner>(
    ctx: &DeployContext<R>,
    target: &ReleaseTarget,
    backup_dir: Option<PathBuf>,
    no_backup: bool,
    dry_run: bool,
) -> Result<Option<PathBuf>> {
    if no_backup {
        ctx.output.warn("Backup skipped (--no-backup)");
        return Ok(None);
    }
    let manager = BackupManager::new(backup_dir.unwrap_or_else(|| ctx.backup_root.clone()));
    if dry_run {
        let dir = manager.target_dir(&target.release, Utc::now());
        ctx.output
            .info(&format!("would back up release to {}", dir.display()));
        return Ok(Some(dir));
    }

    let backup = manager
        .create_backup(&ctx.runner, &target.release, &target.namespace)
        .await?;
    ctx.output
        .success(&format!("Backup written to {}", backup.path.display()));
    Ok(Some(backup.path))
}

async fn run_plan<R: CommandRunner>(
    ctx: &DeployContext<R>,
    mut plan: DeploymentPlan,
    dry_run: bool,
    backup: Option<PathBuf>,
) -> Result<()> {
    let out = &ctx.output;
    tracing::info!(
        plan_id = %plan.id,
        operation = %plan.operation,
        steps = plan.steps.len(),
        dry_run,
        "Executing plan"
    );

    let outcome = PlanExecutor::new(&ctx.runner, *out, dry_run)
        .execute(&mut plan)
        .await;

    if let Err(err) = ctx
        .history
        .record_deployment(&DeploymentHistoryEntry::from_outcome(&plan, &outcome))
    {
        tracing::warn!(error = %err, "Failed to record deployment history");
    }

    if out.is_verbose() && !out.is_json() {
        for step in plan.steps.iter().filter(|s| s.status == StepStatus::Completed) {
            if let Some(detail) = &step.output {
                eprintln!("  {}:\n{}", step.name, indent_lines(detail, "    "));
            }
        }
    }

    if out.is_json() {
        out.json(&PlanReport {
            plan: &plan,
            outcome: &outcome,
            backup: backup.as_ref(),
        })?;
    }

    if let Some(failed) = plan.steps.iter().find(|s| s.status == StepStatus::Failed) {
        if !out.is_json() {
            out.error(&format!("{} failed", failed.name));
            if let Some(detail) = &failed.output {
                eprintln!("{}", indent_lines(detail, "    "));
            }
            out.info(&format!("{} step(s) not run", plan.pending()));
        }
        return Err(EdcError::new(
            ErrorCode::DeployStepFailed,
            format!(
                "step '{}' failed: {}",
                failed.name,
                failed.output.as_deref().unwrap_or("no output")
            ),
        )
        .into());
    }

    if dry_run {
        out.success(&format!(
            "Dry run complete: {} command(s) would run",
            outcome.skipped
        ));
    } else {
        out.success(&format!(
            "{} {} complete ({} steps)",
            plan.operation,
            plan.release,
            outcome.completed
        ));
    }
    Ok(())
}
