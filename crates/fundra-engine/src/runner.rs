//! # Project Rule Runner
//!
//! Loads a project's active rules and supporting entities, then fans the
//! processor out over each rule's targets. Outcomes come back in rule load
//! order, sub-ordered by target id order within a rule.
//!
//! A run may be stopped between rules via a shared flag — never mid-rule,
//! so an in-flight release always runs to completion or explicit failure
//! before the runner acknowledges the stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fundra_core::{RecordId, Rule, RuleTarget};
use fundra_store::RecordStore;
use uuid::Uuid;

use crate::context::EvaluationContext;
use crate::error::EngineError;
use crate::processor::{RuleOutcome, RuleProcessor};
use crate::providers::ProviderRegistry;

/// Entry point the rest of the platform calls: evaluates every active rule
/// of one project, on demand or on a schedule.
pub struct ProjectRuleRunner {
    store: RecordStore,
    processor: RuleProcessor,
    stop: Option<Arc<AtomicBool>>,
}

impl ProjectRuleRunner {
    pub fn new(store: RecordStore, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            store,
            processor: RuleProcessor::new(providers),
            stop: None,
        }
    }

    /// Builder: attach a stop flag checked between rules.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Run all active rules for a project.
    pub async fn run_for_project(
        &self,
        project_id: &RecordId,
    ) -> Result<Vec<RuleOutcome>, EngineError> {
        self.run_for_project_with_metadata(project_id, serde_json::Map::new())
            .await
    }

    /// Run all active rules for a project with caller-supplied context
    /// metadata (surfaced to external condition providers).
    pub async fn run_for_project_with_metadata(
        &self,
        project_id: &RecordId,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Vec<RuleOutcome>, EngineError> {
        let project = self
            .store
            .try_project(project_id)
            .await?
            .ok_or_else(|| EngineError::ProjectNotFound {
                project_id: project_id.clone(),
            })?;

        let rules = self.store.active_rules(project_id).await?;
        let milestones = self.store.project_milestones(project_id).await?;
        let verifications = self.store.project_verifications(project_id).await?;
        let investments = self.store.project_investments(project_id).await?;

        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            project = %project_id,
            rules = rules.len(),
            milestones = milestones.len(),
            verifications = verifications.len(),
            investments = investments.len(),
            "starting rule run"
        );

        let base =
            EvaluationContext::new(project, milestones, verifications, investments, self.store.clone())
                .with_metadata(metadata);

        let mut outcomes = Vec::new();
        for rule in &rules {
            if self.stopped() {
                tracing::info!(%run_id, project = %project_id, "rule run stopped between rules");
                break;
            }
            if !rule.active {
                continue;
            }
            if rule.conditions.is_empty() {
                // Definition error: evaluating would pass vacuously and
                // move funds. Skip the rule, keep the run going.
                tracing::warn!(
                    %run_id,
                    rule = %rule.id,
                    "skipping rule with no conditions"
                );
                continue;
            }
            self.run_rule(rule, &base, &mut outcomes).await?;
        }

        tracing::info!(
            %run_id,
            project = %project_id,
            outcomes = outcomes.len(),
            passed = outcomes.iter().filter(|o| o.passed).count(),
            "rule run finished"
        );
        Ok(outcomes)
    }

    async fn run_rule(
        &self,
        rule: &Rule,
        base: &EvaluationContext,
        outcomes: &mut Vec<RuleOutcome>,
    ) -> Result<(), EngineError> {
        match &rule.target {
            RuleTarget::Project => {
                outcomes.push(self.processor.process_rule(rule, base).await?);
            }
            RuleTarget::Milestone(target_ids) => {
                for target_id in target_ids {
                    let Some(milestone) =
                        base.milestones.iter().find(|m| &m.id == target_id).cloned()
                    else {
                        // A rule may reference a milestone not yet created.
                        tracing::debug!(
                            rule = %rule.id,
                            milestone = %target_id,
                            "target milestone not found; skipping"
                        );
                        continue;
                    };
                    let ctx = base.scoped_to_milestone(milestone);
                    outcomes.push(self.processor.process_rule(rule, &ctx).await?);
                }
            }
            RuleTarget::Investment(target_ids) => {
                for target_id in target_ids {
                    let Some(investment) = base
                        .investments
                        .iter()
                        .find(|i| &i.id == target_id)
                        .cloned()
                    else {
                        tracing::debug!(
                            rule = %rule.id,
                            investment = %target_id,
                            "target investment not found; skipping"
                        );
                        continue;
                    };
                    let ctx = base.scoped_to_investment(investment);
                    outcomes.push(self.processor.process_rule(rule, &ctx).await?);
                }
            }
        }
        Ok(())
    }

    fn stopped(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

impl std::fmt::Debug for ProjectRuleRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectRuleRunner")
            .field("stoppable", &self.stop.is_some())
            .finish_non_exhaustive()
    }
}
