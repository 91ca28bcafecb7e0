//! # Evaluation Context
//!
//! A read-only snapshot of one project's state, assembled per rule-processing
//! call. The context is never mutated in place: scoping a rule to a milestone
//! or investment produces a new context with the target attached.

use chrono::{DateTime, Utc};
use fundra_core::{Investment, Milestone, Project, RecordId, Verification};
use fundra_store::RecordStore;

/// Snapshot of a project's state plus the store handle actions write
/// through.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    pub project: Project,
    pub milestones: Vec<Milestone>,
    pub verifications: Vec<Verification>,
    pub investments: Vec<Investment>,
    /// The milestone a milestone-scoped rule is being evaluated against.
    pub target_milestone: Option<Milestone>,
    /// The investment an investment-scoped rule is being evaluated against.
    pub target_investment: Option<Investment>,
    /// Caller-supplied extra context, surfaced to external condition
    /// providers (e.g. a repository URL for tag lookups).
    pub metadata: serde_json::Map<String, serde_json::Value>,
    store: RecordStore,
}

impl EvaluationContext {
    /// Assemble a base (project-scoped) context.
    pub fn new(
        project: Project,
        milestones: Vec<Milestone>,
        verifications: Vec<Verification>,
        investments: Vec<Investment>,
        store: RecordStore,
    ) -> Self {
        Self {
            project,
            milestones,
            verifications,
            investments,
            target_milestone: None,
            target_investment: None,
            metadata: serde_json::Map::new(),
            store,
        }
    }

    /// Builder: attach caller-supplied metadata.
    pub fn with_metadata(
        mut self,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.metadata = metadata;
        self
    }

    /// A copy of this context scoped to one milestone.
    pub fn scoped_to_milestone(&self, milestone: Milestone) -> Self {
        let mut ctx = self.clone();
        ctx.target_milestone = Some(milestone);
        ctx
    }

    /// A copy of this context scoped to one investment.
    pub fn scoped_to_investment(&self, investment: Investment) -> Self {
        let mut ctx = self.clone();
        ctx.target_investment = Some(investment);
        ctx
    }

    /// The store handle for action writes and lookups.
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Id of the entity this context is scoped to, if any.
    pub fn target_id(&self) -> Option<&RecordId> {
        self.target_milestone
            .as_ref()
            .map(|m| &m.id)
            .or_else(|| self.target_investment.as_ref().map(|i| &i.id))
    }

    /// Latest verification date in the snapshot.
    pub fn latest_verification_at(&self) -> Option<DateTime<Utc>> {
        self.verifications.iter().map(|v| v.verified_at).max()
    }

    /// Latest completion date among completed-and-approved milestones.
    pub fn latest_milestone_completion_at(&self) -> Option<DateTime<Utc>> {
        self.milestones
            .iter()
            .filter(|m| m.is_completed_and_approved())
            .filter_map(|m| m.completed_at)
            .max()
    }
}
