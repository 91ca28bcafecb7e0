//! # Condition Evaluation
//!
//! Pure predicate evaluation over a typed condition and a context snapshot —
//! except `external-condition`, the one kind allowed to perform network I/O
//! through its provider. Evaluation never throws outward: a malformed rule,
//! a missing milestone, or a failed provider lookup all fail closed to "not
//! met" with a warning, so a bad rule cannot crash the runner.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use fundra_core::{Condition, ConditionKind, ConditionResult, RecordId, ReferenceEvent};

use crate::context::EvaluationContext;
use crate::providers::ProviderRegistry;

/// Aggregate result of evaluating a rule's condition list.
#[derive(Debug, Clone)]
pub struct ConditionReport {
    /// Whether every `required` condition was met.
    pub passed: bool,
    /// Per-condition outcomes, in declaration order.
    pub results: Vec<ConditionResult>,
    /// How many conditions (required or not) were met.
    pub met_count: u32,
    pub total_count: u32,
}

/// Evaluates conditions against a context snapshot.
pub struct ConditionEvaluator {
    providers: Arc<ProviderRegistry>,
}

impl ConditionEvaluator {
    pub fn new(providers: Arc<ProviderRegistry>) -> Self {
        Self { providers }
    }

    /// Evaluate one condition against the context, now.
    pub async fn evaluate(&self, condition: &Condition, ctx: &EvaluationContext) -> bool {
        self.evaluate_at(condition, ctx, Utc::now()).await
    }

    /// Evaluate one condition against the context at a given instant.
    pub async fn evaluate_at(
        &self,
        condition: &Condition,
        ctx: &EvaluationContext,
        now: DateTime<Utc>,
    ) -> bool {
        match &condition.kind {
            ConditionKind::MilestoneCompleted { milestone_id } => {
                milestone_completed(milestone_id, ctx)
            }
            ConditionKind::VerificationCount {
                minimum_count,
                milestone_id,
            } => verification_count(*minimum_count, milestone_id.as_ref(), ctx),
            ConditionKind::TimeElapsed {
                hours,
                timestamp,
                after_event,
            } => time_elapsed(*hours, *timestamp, *after_event, ctx, now),
            ConditionKind::ExternalCondition {
                provider,
                condition_name,
                value,
            } => self.external(provider, condition_name, value, ctx).await,
            ConditionKind::ProjectFunding { percentage, amount } => {
                project_funding(*percentage, *amount, ctx)
            }
            ConditionKind::Unknown => {
                tracing::warn!(
                    project = %ctx.project.id,
                    "unknown condition kind evaluated; failing closed"
                );
                false
            }
        }
    }

    /// Evaluate all conditions in order and aggregate the gate decision.
    ///
    /// Non-required conditions are evaluated and recorded but do not gate;
    /// the rule passes iff every required condition is met.
    pub async fn evaluate_all(
        &self,
        conditions: &[Condition],
        ctx: &EvaluationContext,
    ) -> ConditionReport {
        let now = Utc::now();
        let mut results = Vec::with_capacity(conditions.len());
        let mut passed = true;

        for condition in conditions {
            let met = self.evaluate_at(condition, ctx, now).await;
            if condition.required && !met {
                passed = false;
            }
            results.push(ConditionResult {
                condition: condition.kind.label().to_string(),
                required: condition.required,
                met,
            });
        }

        if conditions.iter().all(|c| !c.required) {
            tracing::warn!(
                project = %ctx.project.id,
                "rule has no required conditions; it passes vacuously"
            );
        }

        let met_count = results.iter().filter(|r| r.met).count() as u32;
        ConditionReport {
            passed,
            met_count,
            total_count: results.len() as u32,
            results,
        }
    }

    async fn external(
        &self,
        provider: &str,
        condition_name: &str,
        expected: &serde_json::Value,
        ctx: &EvaluationContext,
    ) -> bool {
        match self
            .providers
            .check(provider, condition_name, &ctx.metadata)
            .await
        {
            Ok(value) => {
                if expected.is_null() {
                    value == serde_json::Value::Bool(true)
                } else {
                    value == *expected
                }
            }
            Err(e) => {
                tracing::warn!(
                    project = %ctx.project.id,
                    provider,
                    condition_name,
                    "external condition lookup failed; treating as not met: {e}"
                );
                false
            }
        }
    }
}

impl std::fmt::Debug for ConditionEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConditionEvaluator")
            .field("providers", &self.providers)
            .finish()
    }
}

fn milestone_completed(milestone_id: &RecordId, ctx: &EvaluationContext) -> bool {
    match ctx.milestones.iter().find(|m| &m.id == milestone_id) {
        Some(milestone) => milestone.is_completed_and_approved(),
        None => {
            // Data integrity gap, not an engine fault: the rule references a
            // milestone the project does not have.
            tracing::warn!(
                project = %ctx.project.id,
                milestone = %milestone_id,
                "milestone-completed condition references a missing milestone"
            );
            false
        }
    }
}

fn verification_count(
    minimum_count: u32,
    milestone_id: Option<&RecordId>,
    ctx: &EvaluationContext,
) -> bool {
    let count = ctx
        .verifications
        .iter()
        .filter(|v| match milestone_id {
            Some(id) => v.milestone_id.as_ref() == Some(id),
            None => true,
        })
        .count();
    count as u32 >= minimum_count
}

fn time_elapsed(
    hours: f64,
    timestamp: Option<DateTime<Utc>>,
    after_event: Option<ReferenceEvent>,
    ctx: &EvaluationContext,
    now: DateTime<Utc>,
) -> bool {
    let reference = timestamp.or_else(|| match after_event {
        Some(ReferenceEvent::VerificationComplete) => ctx.latest_verification_at(),
        Some(ReferenceEvent::MilestoneCompletion) => ctx.latest_milestone_completion_at(),
        Some(ReferenceEvent::InvestmentDate) => {
            ctx.target_investment.as_ref().map(|i| i.created_at)
        }
        None => None,
    });

    let Some(reference) = reference else {
        tracing::warn!(
            project = %ctx.project.id,
            ?after_event,
            "time-elapsed condition has no resolvable reference timestamp"
        );
        return false;
    };

    let elapsed_hours = (now - reference).num_seconds() as f64 / 3600.0;
    elapsed_hours >= hours
}

/// Percentage is checked when present, otherwise the absolute amount; a
/// condition specifying neither fails closed.
fn project_funding(percentage: Option<f64>, amount: Option<f64>, ctx: &EvaluationContext) -> bool {
    if let Some(pct) = percentage {
        return ctx.project.funding_percent() >= pct;
    }
    if let Some(amount) = amount {
        return ctx.project.current_funding >= amount;
    }
    tracing::warn!(
        project = %ctx.project.id,
        "project-funding condition specifies neither percentage nor amount"
    );
    false
}
