//! Plan executor.
//!
//! Runs steps strictly in order and stops at the first failure. Later steps
//! stay `Pending`; nothing is rolled back.

use super::plan::DeploymentPlan;
use crate::process::CommandRunner;
use crate::ui::Output;
use serde::Serialize;
use std::time::Instant;

/// Result of executing a plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanOutcome {
    pub success: bool,
    pub dry_run: bool,
    pub completed: usize,
    pub skipped: usize,
    /// Name of the step that failed.
    pub failed_step: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

pub struct PlanExecutor<'a, R> {
    runner: &'a R,
    output: Output,
    dry_run: bool,
}

impl<'a, R: CommandRunner> PlanExecutor<'a, R> {
    pub fn new(runner: &'a R, output: Output, dry_run: bool) -> Self {
        Self {
            runner,
            output,
            dry_run,
        }
    }

    /// Execute the plan, updating step state in place.
    ///
    /// In dry-run mode mutating steps are printed and marked `Skipped`.
    pub async fn execute(&self, plan: &mut DeploymentPlan) -> PlanOutcome {
        let started = Instant::now();
        let total = plan.steps.len();
        let mut outcome = PlanOutcome {
            dry_run: self.dry_run,
            ..Default::default()
        };

        for (index, step) in plan.steps.iter_mut().enumerate() {
            if self.dry_run && step.invocation.is_mutating() {
                self.output.would_run(&step.command);
                step.skip();
                outcome.skipped += 1;
                continue;
            }

            self.output.step(index + 1, total, &step.name);
            tracing::info!(step = %step.name, command = %step.command, "Running step");
            step.start();

            match self.runner.run(&step.invocation).await {
                Ok(result) if result.success() => {
                    let stdout = result.stdout.trim();
                    step.complete((!stdout.is_empty()).then(|| stdout.to_string()));
                    outcome.completed += 1;
                }
                Ok(result) => {
                    let summary = result.error_summary();
                    tracing::warn!(step = %step.name, status = ?result.status, "Step failed");
                    step.fail(summary.clone());
                    outcome.failed_step = Some(step.name.clone());
                    outcome.error = Some(summary);
                    break;
                }
                Err(err) => {
                    tracing::warn!(step = %step.name, error = %err, "Step could not run");
                    step.fail(err.to_string());
                    outcome.failed_step = Some(step.name.clone());
                    outcome.error = Some(err.to_string());
                    break;
                }
            }
        }

        outcome.success = outcome.failed_step.is_none();
        outcome.duration_ms = started.elapsed().as_millis() as u64;
        outcome
    }
}
