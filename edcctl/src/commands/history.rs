//! `edcctl history`.

use super::helpers::humanize_millis;
use crate::deploy::HistoryManager;
use crate::ui::Output;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Debug, Clone, Args)]
pub struct HistoryArgs {
    /// Only show entries for this release
    #[arg(short = 'r', long)]
    pub release: Option<String>,

    /// Maximum number of entries
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

pub fn history(manager: &HistoryManager, output: &Output, args: HistoryArgs) -> Result<()> {
    let entries = manager.get_history(args.limit, args.release.as_deref())?;

    if output.is_json() {
        return output.json(&entries);
    }
    if entries.is_empty() {
        output.info("No deployments recorded");
        return Ok(());
    }

    output.header("Deployment history");
    for entry in &entries {
        let status = if entry.dry_run {
            "dry-run".dimmed()
        } else if entry.success {
            "ok".green()
        } else {
            "failed".red()
        };
        eprintln!(
            "  {}  {:<9} {:<20} {:<16} {:>8}  {}",
            entry.timestamp,
            entry.operation.to_string(),
            entry.release,
            entry.namespace,
            humanize_millis(entry.duration_ms),
            status
        );
        if let Some(error) = &entry.error {
            eprintln!("      {}", error.dimmed());
        }
    }
    Ok(())
}
