//! Scripted command runner for tests.
//!
//! Responses are matched by program and argument prefix; the first matching
//! rule wins. Unmatched invocations succeed with empty output. Every
//! invocation is recorded so tests can assert on what would have run.

use super::{CommandOutput, CommandRunner, Invocation};
use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct Rule {
    program: String,
    prefix: Vec<String>,
    output: CommandOutput,
}

impl Rule {
    fn matches(&self, invocation: &Invocation) -> bool {
        invocation.program == self.program
            && invocation.args.len() >= self.prefix.len()
            && invocation.args.iter().zip(&self.prefix).all(|(a, p)| a == p)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    rules: Arc<Vec<Rule>>,
    missing: Arc<HashSet<String>>,
    calls: Arc<Mutex<Vec<Invocation>>>,
}

impl MockRunner {
    pub fn builder() -> MockRunnerBuilder {
        MockRunnerBuilder::default()
    }

    /// Everything run so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Recorded invocations that would change state.
    pub fn mutating_invocations(&self) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(Invocation::is_mutating)
            .collect()
    }

    /// Whether any recorded invocation has this program and argument prefix.
    pub fn ran(&self, program: &str, prefix: &[&str]) -> bool {
        self.invocations().iter().any(|inv| {
            inv.program == program
                && inv.args.len() >= prefix.len()
                && inv.args.iter().zip(prefix).all(|(a, p)| a == p)
        })
    }
}

impl CommandRunner for MockRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(invocation.clone());

        let output = self
            .rules
            .iter()
            .find(|rule| rule.matches(invocation))
            .map(|rule| rule.output.clone())
            .unwrap_or_else(|| CommandOutput::ok(""));
        Ok(output)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        if self.missing.contains(program) {
            None
        } else {
            Some(PathBuf::from("/usr/local/bin").join(program))
        }
    }
}

#[derive(Debug, Default)]
pub struct MockRunnerBuilder {
    rules: Vec<Rule>,
    missing: HashSet<String>,
}

impl MockRunnerBuilder {
    /// Respond to `program <prefix...>` with `output`.
    pub fn respond(mut self, program: &str, prefix: &[&str], output: CommandOutput) -> Self {
        self.rules.push(Rule {
            program: program.to_string(),
            prefix: prefix.iter().map(|s| s.to_string()).collect(),
            output,
        });
        self
    }

    /// Make `program` unresolvable on `PATH`.
    pub fn missing_binary(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    pub fn build(self) -> MockRunner {
        MockRunner {
            rules: Arc::new(self.rules),
            missing: Arc::new(self.missing),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}
