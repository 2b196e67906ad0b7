use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A scratch directory acting as `$HOME`, holding a `.env` file.
pub struct TestEnv {
    pub dir: TempDir,
    pub env_file: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        crate::test_log!("FIXTURE: Creating test environment");

        let dir = TempDir::new().expect("Failed to create temp dir");
        let env_file = dir.path().join(".env");
        Self { dir, env_file }
    }

    /// Environment pointing both connectors at `base_url`.
    pub fn with_connectors(base_url: &str) -> Self {
        Self::with_split_connectors(base_url, base_url)
    }

    /// Environment with separate provider and consumer connectors.
    pub fn with_split_connectors(provider_url: &str, consumer_url: &str) -> Self {
        let env = Self::new();
        env.write_env(&format!(
            r#"# provider
ASSET_ID=asset-1
PROVIDER_URL={provider_url}
PROVIDER_BPN=BPNL000000000001
PROVIDER_API_KEY="provider-key"

# consumer
export CONSUMER_URL={consumer_url}/
CONSUMER_BPN=BPNL000000000002
CONSUMER_API_KEY='consumer-key'
"#
        ));
        env
    }

    pub fn write_env(&self, content: &str) {
        fs::write(&self.env_file, content).expect("Failed to write .env");
    }

    pub fn home(&self) -> &Path {
        self.dir.path()
    }

    pub fn history_file(&self) -> PathBuf {
        self.home()
            .join("data")
            .join("edcctl")
            .join("history")
            .join("deployments.jsonl")
    }
}

/// The edcctl binary, isolated from the caller's home and settings.
pub fn edcctl(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_edcctl"));
    cmd.env("HOME", home)
        .env("XDG_DATA_HOME", home.join("data"))
        .env("XDG_CONFIG_HOME", home.join("config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    for (key, _) in std::env::vars() {
        if key.starts_with("EDCCTL_") {
            cmd.env_remove(key);
        }
    }
    cmd
}
