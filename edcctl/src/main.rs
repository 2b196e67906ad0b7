//! edcctl - deploy an EDC connector stack and run the DSP workflow.
#![forbid(unsafe_code)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use edc_common::{EdcError, ErrorCode, LogConfig, Settings, init_logging};
use edcctl::commands::{
    self, DeployContext, HistoryArgs, InstallArgs, StatusArgs, UninstallArgs, UpgradeArgs,
    WorkflowArgs,
};
use edcctl::deploy::{BackupManager, HistoryManager};
use edcctl::process::SystemRunner;
use edcctl::ui::Output;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "edcctl")]
#[command(author, version, about = "Deploy an EDC connector stack and drive the DSP workflow")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print final reports as JSON on stdout
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the connector (and optionally the infrastructure)
    Install(InstallArgs),
    /// Upgrade an existing connector release
    Upgrade(UpgradeArgs),
    /// Remove the connector release
    Uninstall(UninstallArgs),
    /// Show release state and pods
    Status(StatusArgs),
    /// List recorded deployments
    History(HistoryArgs),
    /// Run the provider/consumer DSP workflow
    Workflow(WorkflowArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = tokio::select! {
        result = run(cli) => result,
        () = shutdown_signal() => {
            Err(EdcError::new(ErrorCode::UsageInterrupted, "Interrupted").into())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(&err),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let output = Output::new(cli.json, cli.verbose);
    let (settings, errors) = Settings::from_env();
    if !errors.is_empty() {
        for error in &errors {
            output.error(&error.to_string());
        }
        let vars: Vec<&str> = errors.iter().map(|e| e.var()).collect();
        return Err(EdcError::new(ErrorCode::ConfigInvalidValue, vars.join(", ")).into());
    }

    // The workflow's DEBUG key can raise the log level, so that command
    // reads its file before logging starts.
    if !matches!(cli.command, Commands::Workflow(_)) {
        start_logging(&settings, cli.verbose)?;
    }

    match cli.command {
        Commands::Workflow(args) => {
            let config = commands::workflow::load_config(&args.env_file, &output)?;
            start_logging(&settings, cli.verbose || config.debug)?;
            commands::workflow::workflow(config, &settings, &output, &args).await?;
            Ok(())
        }
        Commands::History(args) => {
            commands::history::history(&HistoryManager::new()?, &output, args)
        }
        Commands::Status(args) => {
            commands::status::status(
                &SystemRunner,
                &output,
                &HistoryManager::new()?,
                settings.config_path.value.clone(),
                args,
            )
            .await
        }
        Commands::Install(args) => {
            commands::deploy::install(&deploy_context(&settings, output)?, args).await
        }
        Commands::Upgrade(args) => {
            commands::deploy::upgrade(&deploy_context(&settings, output)?, args).await
        }
        Commands::Uninstall(args) => {
            commands::deploy::uninstall(&deploy_context(&settings, output)?, args).await
        }
    }
}

fn start_logging(settings: &Settings, debug: bool) -> Result<()> {
    init_logging(&LogConfig::from_settings(settings).with_debug(debug))?;
    tracing::debug!(
        log_level = %settings.log_level.value,
        http_timeout = ?settings.http_timeout.value,
        "Settings loaded"
    );
    Ok(())
}

fn deploy_context(settings: &Settings, output: Output) -> Result<DeployContext<SystemRunner>> {
    Ok(DeployContext {
        runner: SystemRunner,
        output,
        history: HistoryManager::new()?,
        backup_root: settings
            .backup_dir
            .value
            .clone()
            .unwrap_or_else(BackupManager::default_root),
        config_path: settings.config_path.value.clone(),
    })
}

fn report_error(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<EdcError>() {
        Some(edc) if edc.code == ErrorCode::UsageInterrupted => {
            eprintln!("Interrupted");
            ExitCode::from(edc.exit_code())
        }
        Some(edc) => {
            tracing::debug!(code = %edc.code.code_string(), "Command failed");
            eprint!("{}", edc.format_full());
            ExitCode::from(edc.exit_code())
        }
        None => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Resolves on SIGINT or SIGTERM. Pends forever when no handler can be
/// installed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received terminate signal"),
    }
}
