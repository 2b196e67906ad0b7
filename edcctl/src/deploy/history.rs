//! Deployment history management.
//!
//! Every lifecycle run appends one JSON line to `deployments.jsonl`.

use super::executor::PlanOutcome;
use super::plan::{DeploymentPlan, Operation};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

const HISTORY_FILE: &str = "deployments.jsonl";

/// A deployment history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentHistoryEntry {
    /// RFC 3339 time the run started.
    pub timestamp: String,
    pub plan_id: Uuid,
    pub operation: Operation,
    pub release: String,
    pub namespace: String,
    /// Whether the run succeeded.
    pub success: bool,
    pub dry_run: bool,
    /// Duration in milliseconds.
    pub duration_ms: u64,
    /// Error message if failed.
    pub error: Option<String>,
}

impl DeploymentHistoryEntry {
    pub fn from_outcome(plan: &DeploymentPlan, outcome: &PlanOutcome) -> Self {
        Self {
            timestamp: plan.created_at.to_rfc3339(),
            plan_id: plan.id,
            operation: plan.operation,
            release: plan.release.clone(),
            namespace: plan.namespace.clone(),
            success: outcome.success,
            dry_run: outcome.dry_run,
            duration_ms: outcome.duration_ms,
            error: outcome.error.clone(),
        }
    }
}

/// Manages deployment history storage and retrieval.
pub struct HistoryManager {
    history_dir: PathBuf,
}

impl HistoryManager {
    /// Use `<data-dir>/edcctl/history`.
    pub fn new() -> Result<Self> {
        let history_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("edcctl")
            .join("history");
        Self::with_dir(history_dir)
    }

    pub fn with_dir(history_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&history_dir)?;
        Ok(Self { history_dir })
    }

    /// Get deployment history, optionally filtered by release.
    ///
    /// Most recent first. Lines that do not parse are skipped.
    pub fn get_history(
        &self,
        limit: usize,
        release: Option<&str>,
    ) -> Result<Vec<DeploymentHistoryEntry>> {
        let history_file = self.history_dir.join(HISTORY_FILE);

        if !history_file.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&history_file)?;
        let mut entries: Vec<DeploymentHistoryEntry> = content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();

        if let Some(release) = release {
            entries.retain(|e| e.release == release);
        }

        // RFC 3339 in UTC sorts lexically
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);

        Ok(entries)
    }

    /// Record a new deployment.
    pub fn record_deployment(&self, entry: &DeploymentHistoryEntry) -> Result<()> {
        let history_file = self.history_dir.join(HISTORY_FILE);

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&history_file)?;
        writeln!(file, "{}", serde_json::to_string(entry)?)?;

        Ok(())
    }

    /// The last successful, non-dry-run deployment of a release.
    pub fn last_successful(&self, release: &str) -> Result<Option<DeploymentHistoryEntry>> {
        let history = self.get_history(usize::MAX, Some(release))?;
        Ok(history.into_iter().find(|e| e.success && !e.dry_run))
    }
}
