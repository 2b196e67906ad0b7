//! `edcctl workflow`: run the DSP workflow from a `.env` file.

use crate::ui::Output;
use crate::workflow::{PollPolicy, Workflow, WorkflowReport};
use anyhow::Result;
use clap::Args;
use edc_common::config::DotenvError;
use edc_common::{EdcError, EnvError, EnvFile, ErrorCode, Settings, WorkflowConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Args)]
pub struct WorkflowArgs {
    /// Environment file with the connector endpoints and keys
    #[arg(long, default_value = ".env")]
    pub env_file: PathBuf,

    /// Interval between EDR polls [default: 3s]
    #[arg(long, value_parser = humantime::parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Number of EDR polls before giving up [default: 20]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub poll_attempts: Option<u32>,
}

/// Read and validate the workflow configuration.
///
/// Every problem in the file is printed on its own line before the
/// combined error is returned.
pub fn load_config(path: &Path, output: &Output) -> Result<WorkflowConfig> {
    let env = EnvFile::load(path).map_err(|err| {
        let code = match &err {
            DotenvError::NotFound { .. } => ErrorCode::ConfigEnvFileNotFound,
            DotenvError::Io { .. } => ErrorCode::InternalIo,
            DotenvError::Malformed { .. } => ErrorCode::ConfigEnvFileMalformed,
        };
        EdcError::new(code, format!("{}: {err}", path.display()))
    })?;

    WorkflowConfig::from_env_file(&env).map_err(|errors| {
        for error in &errors {
            output.error(&error.to_string());
        }
        config_error(&errors).into()
    })
}

fn config_error(errors: &[EnvError]) -> EdcError {
    let missing: Vec<&str> = errors
        .iter()
        .filter(|e| matches!(e, EnvError::Missing { .. }))
        .map(EnvError::var)
        .collect();
    if missing.is_empty() {
        let vars: Vec<&str> = errors.iter().map(EnvError::var).collect();
        EdcError::new(ErrorCode::ConfigInvalidValue, vars.join(", "))
    } else {
        EdcError::new(ErrorCode::ConfigMissingKey, missing.join(", "))
    }
}

/// CLI flags first, then `EDCCTL_POLL_*`, then the defaults.
pub fn poll_policy(settings: &Settings, args: &WorkflowArgs) -> PollPolicy {
    PollPolicy {
        interval: settings
            .poll_interval
            .clone()
            .override_with(args.poll_interval)
            .value,
        attempts: settings
            .poll_attempts
            .clone()
            .override_with(args.poll_attempts)
            .value,
    }
}

pub async fn workflow(
    config: WorkflowConfig,
    settings: &Settings,
    output: &Output,
    args: &WorkflowArgs,
) -> Result<WorkflowReport> {
    let poll = poll_policy(settings, args);
    tracing::debug!(?config, ?poll, "Workflow configuration");

    let report = Workflow::new(config, settings.http_timeout.value, poll, *output)?
        .run()
        .await?;

    if output.is_json() {
        output.json(&report)?;
    } else {
        output.success("Workflow complete");
        println!("{}", report.data);
    }
    Ok(report)
}
