//! # Rule Processing
//!
//! One rule evaluation runs a fixed pipeline: evaluate all conditions, write
//! the evaluation audit record, execute actions only if the required
//! conditions passed, return the outcome. The audit write happens for every
//! attempt, pass or fail, before any action runs; a failed audit write is
//! logged and surfaced on the outcome but does not block the decision —
//! audit is best-effort, not transactional with it.
//!
//! Expected evaluation paths never throw. The one raise is a rule with no
//! conditions, which is a definition error the processor refuses to run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fundra_core::{ConditionResult, EvaluationRecord, RecordId, Rule};
use serde::{Deserialize, Serialize};

use crate::actions::{ActionExecutor, ActionResult};
use crate::conditions::ConditionEvaluator;
use crate::context::EvaluationContext;
use crate::error::EngineError;
use crate::providers::ProviderRegistry;

/// Outcome of one rule evaluation, returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub rule_id: RecordId,
    pub rule_name: String,
    /// The milestone/investment the evaluation was scoped to, if any.
    pub target_id: Option<RecordId>,
    pub passed: bool,
    pub condition_results: Vec<ConditionResult>,
    /// Empty when the rule did not pass.
    pub action_results: Vec<ActionResult>,
    /// Whether the evaluation audit record was persisted.
    pub audit_recorded: bool,
    /// The audit write failure, when there was one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_error: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

/// Runs single rules through the evaluate → record → act pipeline.
pub struct RuleProcessor {
    evaluator: ConditionEvaluator,
    executor: ActionExecutor,
}

impl RuleProcessor {
    pub fn new(providers: Arc<ProviderRegistry>) -> Self {
        Self {
            evaluator: ConditionEvaluator::new(providers),
            executor: ActionExecutor::new(),
        }
    }

    /// Process one rule against a prepared context.
    pub async fn process_rule(
        &self,
        rule: &Rule,
        ctx: &EvaluationContext,
    ) -> Result<RuleOutcome, EngineError> {
        if rule.conditions.is_empty() {
            return Err(EngineError::EmptyConditionSet {
                rule_id: rule.id.clone(),
            });
        }

        let evaluated_at = Utc::now();
        let report = self.evaluator.evaluate_all(&rule.conditions, ctx).await;

        let record = EvaluationRecord {
            id: None,
            rule_id: rule.id.clone(),
            project_id: rule.project_id.clone(),
            target_id: ctx.target_id().cloned(),
            evaluated_at,
            condition_results: report.results.clone(),
            conditions_met: report.met_count,
            conditions_total: report.total_count,
            passed: report.passed,
        };

        let (audit_recorded, audit_error) = match ctx.store().append_evaluation(&record).await {
            Ok(_) => (true, None),
            Err(e) => {
                tracing::error!(
                    rule = %rule.id,
                    project = %rule.project_id,
                    "evaluation record write failed: {e}"
                );
                (false, Some(e.to_string()))
            }
        };

        let action_results = if report.passed {
            tracing::info!(
                rule = %rule.id,
                project = %rule.project_id,
                target = ctx.target_id().map(RecordId::as_str),
                "rule passed; executing {} action(s)",
                rule.actions.len()
            );
            self.executor.execute_all(&rule.actions, ctx).await
        } else {
            tracing::debug!(
                rule = %rule.id,
                project = %rule.project_id,
                met = report.met_count,
                total = report.total_count,
                "rule did not pass"
            );
            Vec::new()
        };

        Ok(RuleOutcome {
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            target_id: ctx.target_id().cloned(),
            passed: report.passed,
            condition_results: report.results,
            action_results,
            audit_recorded,
            audit_error,
            evaluated_at,
        })
    }
}

impl std::fmt::Debug for RuleProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleProcessor").finish_non_exhaustive()
    }
}
