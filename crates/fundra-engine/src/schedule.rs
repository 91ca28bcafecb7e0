//! # Periodic Re-evaluation
//!
//! Nothing re-triggers a `time-elapsed` condition on its own, so deployments
//! run the engine on an interval as well as on demand. The loop walks the
//! configured projects each tick and honors the same stop flag discipline as
//! the runner: stop between runs, never mid-rule.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fundra_core::RecordId;

use crate::error::EngineError;
use crate::runner::ProjectRuleRunner;

/// Interval-driven re-evaluation over a fixed set of projects.
pub struct ScheduledRunner {
    runner: ProjectRuleRunner,
    interval: Duration,
    projects: Vec<RecordId>,
}

impl ScheduledRunner {
    pub fn new(runner: ProjectRuleRunner, interval: Duration, projects: Vec<RecordId>) -> Self {
        Self {
            runner,
            interval,
            projects,
        }
    }

    /// Run until the stop flag is raised. Per-project failures (project
    /// deleted, store briefly down) are logged and do not end the loop.
    pub async fn run(&self, stop: Arc<AtomicBool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // interval fires immediately; the first tick starts the first pass.
        loop {
            ticker.tick().await;
            if stop.load(Ordering::Relaxed) {
                break;
            }
            for project_id in &self.projects {
                if stop.load(Ordering::Relaxed) {
                    return;
                }
                match self.runner.run_for_project(project_id).await {
                    Ok(outcomes) => {
                        tracing::info!(
                            project = %project_id,
                            outcomes = outcomes.len(),
                            passed = outcomes.iter().filter(|o| o.passed).count(),
                            "scheduled pass complete"
                        );
                    }
                    Err(EngineError::ProjectNotFound { .. }) => {
                        tracing::warn!(
                            project = %project_id,
                            "scheduled project no longer exists"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            project = %project_id,
                            "scheduled pass failed: {e}"
                        );
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for ScheduledRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledRunner")
            .field("interval", &self.interval)
            .field("projects", &self.projects.len())
            .finish()
    }
}
