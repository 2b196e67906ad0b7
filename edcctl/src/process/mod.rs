//! External command execution for `helm` and `kubectl`.
//!
//! All cluster interaction goes through a [`CommandRunner`]. The real
//! implementation spawns processes; tests substitute [`MockRunner`] to
//! record invocations and script responses.

pub mod mock;

pub use mock::MockRunner;

use anyhow::Result;
use edc_common::{EdcError, ErrorCode, is_sensitive_key, mask_sensitive};
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Read-only `helm` subcommands (first argument).
const HELM_READ_ONLY: &[&str] = &[
    "version", "status", "list", "ls", "get", "history", "show", "search", "template", "lint",
    "env",
];

/// Read-only `kubectl` subcommands (first argument).
const KUBECTL_READ_ONLY: &[&str] = &[
    "version",
    "cluster-info",
    "get",
    "describe",
    "logs",
    "api-resources",
    "explain",
    "wait",
    "top",
];

/// One external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Written to the child's stdin, then stdin is closed.
    pub stdin: Option<String>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    pub fn helm<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("helm", args)
    }

    pub fn kubectl<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("kubectl", args)
    }

    pub fn with_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Whether running this command can change cluster or local Helm state.
    ///
    /// Unknown programs and subcommands count as mutating.
    pub fn is_mutating(&self) -> bool {
        let first = self.args.first().map(String::as_str).unwrap_or_default();
        let second = self.args.get(1).map(String::as_str).unwrap_or_default();
        match self.program.as_str() {
            "helm" => {
                !(HELM_READ_ONLY.contains(&first) || (first == "repo" && second == "list"))
            }
            "kubectl" => {
                let config_read = first == "config" && matches!(second, "view" | "current-context");
                let auth_read = first == "auth" && matches!(second, "can-i" | "whoami");
                !(KUBECTL_READ_ONLY.contains(&first) || config_read || auth_read)
            }
            _ => true,
        }
    }

    /// Shell-escaped command line with secrets masked.
    pub fn display(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 2);
        parts.push(escape(&self.program));

        let mut previous: Option<&str> = None;
        for arg in &self.args {
            let masked = match previous {
                Some(flag) if flag.starts_with("--") && is_sensitive_key(flag) => "***".to_string(),
                _ => mask_sensitive(arg),
            };
            parts.push(escape(&masked));
            previous = Some(arg);
        }

        if self.stdin.is_some() {
            parts.push("<<EOF".to_string());
        }
        parts.join(" ")
    }
}

fn escape(value: &str) -> String {
    shell_escape::escape(value.into()).into_owned()
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status; `None` when killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Last non-empty stderr line, or stdout when stderr is empty.
    pub fn error_summary(&self) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        source
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no output")
            .trim()
            .to_string()
    }
}

/// Runs external commands.
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture output. A non-zero exit is not an
    /// error at this level; only failing to spawn is.
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<CommandOutput>> + Send;

    /// Resolve a program on `PATH`.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        tracing::debug!(command = %invocation.display(), "Running command");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|err| {
            EdcError::new(
                ErrorCode::DeployCommandSpawn,
                format!("failed to start {}: {err}", invocation.program),
            )
        })?;

        if let Some(input) = &invocation.stdin
            && let Some(mut stdin) = child.stdin.take()
        {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;
        let result = CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        tracing::debug!(
            program = %invocation.program,
            status = ?result.status,
            "Command finished"
        );
        Ok(result)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}
