//! Pre-change backups of a release.
//!
//! Before `upgrade` and `uninstall` the release's values, rendered manifest
//! and the namespace's live objects are dumped to plain files under
//! `<root>/<release>-<YYYYmmdd-HHMMSS>/`. Backups are for manual recovery;
//! nothing restores them automatically.

use crate::process::{CommandRunner, Invocation};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use edc_common::{EdcError, ErrorCode};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Metadata written next to the dumps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseBackup {
    pub release: String,
    pub namespace: String,
    pub created_at: DateTime<Utc>,
    pub path: PathBuf,
    /// Files written, relative to `path`.
    pub files: Vec<String>,
}

pub struct BackupManager {
    root: PathBuf,
}

impl BackupManager {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// `<data-dir>/edcctl/backups`, or `./edcctl-backups` without a data dir.
    pub fn default_root() -> PathBuf {
        dirs::data_local_dir()
            .map(|dir| dir.join("edcctl").join("backups"))
            .unwrap_or_else(|| PathBuf::from("edcctl-backups"))
    }

    /// Directory a backup taken at `now` would be written to.
    pub fn target_dir(&self, release: &str, now: DateTime<Utc>) -> PathBuf {
        self.root
            .join(format!("{release}-{}", now.format("%Y%m%d-%H%M%S")))
    }

    /// Dump the release. Any failing dump aborts with `DeployBackupFailed`.
    pub async fn create_backup<R: CommandRunner>(
        &self,
        runner: &R,
        release: &str,
        namespace: &str,
    ) -> Result<ReleaseBackup> {
        let created_at = Utc::now();
        let dir = self.target_dir(release, created_at);
        fs::create_dir_all(&dir).map_err(|err| {
            EdcError::new(
                ErrorCode::DeployBackupFailed,
                format!("cannot create {}: {err}", dir.display()),
            )
        })?;

        let dumps = [
            (
                "values.yaml",
                Invocation::helm([
                    "get", "values", release, "--namespace", namespace, "--all", "-o", "yaml",
                ]),
            ),
            (
                "manifest.yaml",
                Invocation::helm(["get", "manifest", release, "--namespace", namespace]),
            ),
            (
                "resources.yaml",
                Invocation::kubectl(["get", "all", "--namespace", namespace, "-o", "yaml"]),
            ),
        ];

        let mut files = Vec::with_capacity(dumps.len() + 1);
        for (file, invocation) in dumps {
            let output = runner.run(&invocation).await?;
            if !output.success() {
                return Err(EdcError::new(
                    ErrorCode::DeployBackupFailed,
                    format!("{} failed: {}", invocation.display(), output.error_summary()),
                )
                .into());
            }
            let path = dir.join(file);
            fs::write(&path, &output.stdout)
                .with_context(|| format!("writing {}", path.display()))?;
            files.push(file.to_string());
        }

        files.push("metadata.json".to_string());
        let backup = ReleaseBackup {
            release: release.to_string(),
            namespace: namespace.to_string(),
            created_at,
            path: dir.clone(),
            files,
        };
        fs::write(
            dir.join("metadata.json"),
            serde_json::to_string_pretty(&backup)?,
        )?;

        tracing::info!(release, path = %dir.display(), "Backup written");
        Ok(backup)
    }
}
