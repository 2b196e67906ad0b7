//! User-facing terminal output.
//!
//! Human messages go to stderr with colored status markers; stdout is kept
//! for JSON documents (`--json`) and the workflow's data body.

use colored::Colorize;
use is_terminal::IsTerminal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    json: bool,
    verbose: bool,
}

impl Output {
    pub fn new(json: bool, verbose: bool) -> Self {
        if !std::io::stderr().is_terminal() {
            colored::control::set_override(false);
        }
        Self { json, verbose }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn header(&self, title: &str) {
        if !self.json {
            eprintln!("{}", title.bold());
        }
    }

    pub fn info(&self, message: &str) {
        if !self.json {
            eprintln!("  {} {}", "→".dimmed(), message);
        }
    }

    pub fn success(&self, message: &str) {
        if !self.json {
            eprintln!("  {} {}", "✓".green(), message);
        }
    }

    pub fn warn(&self, message: &str) {
        eprintln!("  {} {}", "!".yellow(), message.yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("  {} {}", "✗".red(), message);
    }

    /// A numbered step, e.g. `[2/6] Creating policy`.
    pub fn step(&self, index: usize, total: usize, message: &str) {
        if !self.json {
            eprintln!("{} {}", format!("[{index}/{total}]").cyan(), message);
        }
    }

    /// A command that is shown instead of run.
    pub fn would_run(&self, command: &str) {
        if !self.json {
            eprintln!("  {} {}", "would run:".dimmed(), command);
        }
    }

    /// Print a value as pretty JSON on stdout.
    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Ask a yes/no question. Returns `false` without a terminal.
pub fn confirm(prompt: &str) -> bool {
    if !std::io::stdin().is_terminal() || !std::io::stderr().is_terminal() {
        tracing::debug!("No terminal attached; treating confirmation as declined");
        return false;
    }
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}
