//! Build executor with progress reporting.
//!
//! Steps run in waves: every step whose dependencies have all succeeded
//! runs in parallel on a rayon pool. A failed step's dependents are skipped;
//! steps that do not depend on it still run.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::builder::plan::{BuildPlan, BuildStep, PlannedStep, StepId};
use crate::util::shell::{format_duration, Shell, Status};

/// Runs individual plan steps.
pub trait StepRunner: Sync {
    fn run(&self, step: &BuildStep) -> Result<()>;
}

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Succeeded,
    Failed,
    Skipped,
}

/// A step that failed, with the tool's output.
#[derive(Debug, Clone)]
pub struct StepFailure {
    pub id: StepId,
    pub description: String,
    pub message: String,
}

/// What happened to every step of a plan.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub states: Vec<StepState>,
    pub failures: Vec<StepFailure>,
    pub duration: Duration,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.states.iter().all(|s| *s == StepState::Succeeded)
    }

    pub fn state(&self, id: StepId) -> Option<StepState> {
        self.states.get(id.0).copied()
    }

    pub fn succeeded(&self) -> usize {
        self.count(StepState::Succeeded)
    }

    pub fn skipped(&self) -> usize {
        self.count(StepState::Skipped)
    }

    fn count(&self, state: StepState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }
}

/// Build executor with progress tracking.
pub struct BuildExecutor<'a> {
    runner: &'a dyn StepRunner,
    shell: Arc<Shell>,
    root: &'a Path,
    jobs: Option<usize>,
}

impl<'a> BuildExecutor<'a> {
    /// `root` is only used to shorten paths in status lines.
    pub fn new(runner: &'a dyn StepRunner, shell: Arc<Shell>, root: &'a Path) -> Self {
        BuildExecutor {
            runner,
            shell,
            root,
            jobs: None,
        }
    }

    /// Limit the number of steps running at once.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Execute a build plan with progress reporting.
    pub fn execute(&self, plan: &BuildPlan) -> Result<BuildReport> {
        let start = Instant::now();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs.unwrap_or(0))
            .build()
            .context("failed to start build workers")?;

        let progress = self.shell.progress(plan.len() as u64, "Building");
        let mut states = vec![StepState::Pending; plan.len()];
        let mut failures = Vec::new();

        loop {
            // Plan order is topological, so one forward pass settles skips.
            let mut ready: Vec<&PlannedStep> = Vec::new();
            for planned in &plan.steps {
                if states[planned.id.0] != StepState::Pending {
                    continue;
                }
                let blocked = planned
                    .deps
                    .iter()
                    .any(|d| matches!(states[d.0], StepState::Failed | StepState::Skipped));
                let unblocked = planned
                    .deps
                    .iter()
                    .all(|d| states[d.0] == StepState::Succeeded);
                if blocked {
                    states[planned.id.0] = StepState::Skipped;
                    progress.inc(1);
                } else if unblocked {
                    ready.push(planned);
                }
            }
            if ready.is_empty() {
                break;
            }

            let results: Vec<(StepId, Result<()>)> = pool.install(|| {
                ready
                    .par_iter()
                    .map(|planned| {
                        if self.shell.is_verbose() {
                            self.shell
                                .status(status_of(&planned.step), planned.step.describe(self.root));
                        }
                        (planned.id, self.runner.run(&planned.step))
                    })
                    .collect()
            });

            for (id, result) in results {
                progress.inc(1);
                match result {
                    Ok(()) => states[id.0] = StepState::Succeeded,
                    Err(err) => {
                        states[id.0] = StepState::Failed;
                        let description = plan.steps[id.0].step.describe(self.root);
                        tracing::debug!("step {} ({}) failed", id, description);
                        failures.push(StepFailure {
                            id,
                            description,
                            message: format!("{:#}", err),
                        });
                    }
                }
            }
        }
        progress.finish();

        let report = BuildReport {
            states,
            failures,
            duration: start.elapsed(),
        };
        self.summarize(&report);
        Ok(report)
    }

    fn summarize(&self, report: &BuildReport) {
        for failure in &report.failures {
            self.shell.error(format!("failed to build {}", failure.description));
            if !failure.message.is_empty() {
                eprintln!("{}", failure.message.trim_end());
            }
        }
        if report.skipped() > 0 {
            self.shell.status(
                Status::Skipped,
                format!("{} step(s) after failures", report.skipped()),
            );
        }
        if report.is_success() {
            self.shell.status(
                Status::Finished,
                format!(
                    "{} step(s) in {}",
                    report.succeeded(),
                    format_duration(report.duration)
                ),
            );
        }
    }
}

fn status_of(step: &BuildStep) -> Status {
    match step {
        BuildStep::Compile(_) => Status::Compiling,
        BuildStep::Archive(_) => Status::Archiving,
        BuildStep::Link(_) => Status::Linking,
        BuildStep::Install(_) => Status::Installing,
    }
}
