//! # Escrow Release Rules
//!
//! A rule names an ordered set of conditions and an ordered set of actions,
//! scoped to a whole project or to specific milestones/investments. Rules are
//! authored by platform operators and consumed read-only by the engine.
//!
//! Condition and action kinds are closed enums with kebab-case wire tags, so
//! adding a kind is a compile-time-checked change. An unrecognized tag
//! deserializes to the `Unknown` variant instead of failing the rule load —
//! the engine then fails that condition/action closed at evaluation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Sentinel wallet value meaning "resolve to the project owner's wallet".
pub const PROJECT_OWNER_WALLET: &str = "project-owner";

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// What a rule applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "targetType", content = "targetIds", rename_all = "snake_case")]
pub enum RuleTarget {
    /// One evaluation against the project as a whole.
    Project,
    /// One evaluation per listed milestone that exists.
    Milestone(Vec<RecordId>),
    /// One evaluation per listed investment that exists.
    Investment(Vec<RecordId>),
}

/// An escrow release rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: RecordId,
    pub project_id: RecordId,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(flatten)]
    pub target: RuleTarget,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub actions: Vec<Action>,
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// A single testable predicate plus its gating flag.
///
/// A rule passes iff every `required` condition is met. Non-required
/// conditions are still evaluated and recorded, but do not gate execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    /// Whether this condition gates action execution. Defaults to `true`:
    /// an operator who forgets the flag gets the stricter reading.
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(flatten)]
    pub kind: ConditionKind,
}

fn default_true() -> bool {
    true
}

/// The named reference event a `time-elapsed` condition counts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceEvent {
    /// Latest verification date in the context.
    VerificationComplete,
    /// Latest completed-and-approved milestone's completion date.
    MilestoneCompletion,
    /// The targeted investment's creation date.
    InvestmentDate,
}

impl ReferenceEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VerificationComplete => "verification_complete",
            Self::MilestoneCompletion => "milestone_completion",
            Self::InvestmentDate => "investment_date",
        }
    }
}

/// Condition kinds, tagged by `type` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConditionKind {
    /// The named milestone is completed and administratively approved.
    #[serde(rename_all = "camelCase")]
    MilestoneCompleted { milestone_id: RecordId },

    /// At least `minimum_count` verifications exist, optionally scoped to
    /// one milestone.
    #[serde(rename_all = "camelCase")]
    VerificationCount {
        minimum_count: u32,
        #[serde(default)]
        milestone_id: Option<RecordId>,
    },

    /// At least `hours` have elapsed since a reference timestamp — either
    /// the explicit `timestamp` or the resolved `after_event`.
    #[serde(rename_all = "camelCase")]
    TimeElapsed {
        hours: f64,
        #[serde(default)]
        timestamp: Option<DateTime<Utc>>,
        #[serde(default)]
        after_event: Option<ReferenceEvent>,
    },

    /// A pluggable external lookup (repo tag published, website reachable,
    /// listing live) reports the expected value.
    #[serde(rename_all = "camelCase")]
    ExternalCondition {
        provider: String,
        condition_name: String,
        /// Expected lookup result; `null` means "condition holds at all".
        #[serde(default)]
        value: serde_json::Value,
    },

    /// Project funding meets a percentage of the goal or an absolute amount,
    /// whichever is specified.
    #[serde(rename_all = "camelCase")]
    ProjectFunding {
        #[serde(default)]
        percentage: Option<f64>,
        #[serde(default)]
        amount: Option<f64>,
    },

    /// Any condition type this build does not implement. Always evaluates
    /// to not-met.
    #[serde(other)]
    Unknown,
}

impl ConditionKind {
    /// The wire tag, used as the label in audit records.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MilestoneCompleted { .. } => "milestone-completed",
            Self::VerificationCount { .. } => "verification-count",
            Self::TimeElapsed { .. } => "time-elapsed",
            Self::ExternalCondition { .. } => "external-condition",
            Self::ProjectFunding { .. } => "project-funding",
            Self::Unknown => "unknown",
        }
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Recipient groups a `notify` action resolves to user ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyTarget {
    ProjectOwner,
    Investors,
    Admin,
    /// Any target name this build does not resolve; skipped with a warning.
    #[serde(untagged)]
    Other(String),
}

impl NotifyTarget {
    pub fn as_str(&self) -> &str {
        match self {
            Self::ProjectOwner => "project_owner",
            Self::Investors => "investors",
            Self::Admin => "admin",
            Self::Other(target) => target,
        }
    }
}

/// Entity collections an `update-status` action may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetEntity {
    Project,
    Milestone,
    Investment,
}

impl TargetEntity {
    /// The store collection holding this entity type.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Milestone => "milestones",
            Self::Investment => "investments",
        }
    }
}

/// Action kinds, tagged by `type` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    /// Release one disbursement phase of the targeted investment, sized by
    /// an absolute amount or a percentage of the investment.
    #[serde(rename_all = "camelCase")]
    ReleaseFunds {
        #[serde(default)]
        amount: Option<f64>,
        #[serde(default)]
        percentage: Option<f64>,
        /// Destination wallet; [`PROJECT_OWNER_WALLET`] resolves to the
        /// project owner's connected wallet.
        #[serde(default = "default_target_wallet")]
        target_wallet: String,
        #[serde(default)]
        note: Option<String>,
    },

    /// Write one notification record per resolved recipient.
    #[serde(rename_all = "camelCase")]
    Notify {
        targets: Vec<NotifyTarget>,
        /// Template name (`funds_released`, `milestone_verified`,
        /// `pending_verification`, or anything else for the generic text).
        template: String,
    },

    /// Patch the status field of a project, milestone, or investment.
    #[serde(rename_all = "camelCase")]
    UpdateStatus {
        entity: TargetEntity,
        /// Explicit target id; falls back to the context's entity of the
        /// matching type.
        #[serde(default)]
        entity_id: Option<RecordId>,
        status: String,
    },

    /// Any action type this build does not implement. Always fails closed.
    #[serde(other)]
    Unknown,
}

fn default_target_wallet() -> String {
    PROJECT_OWNER_WALLET.to_string()
}

impl Action {
    /// The wire tag, used as the label in action results.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ReleaseFunds { .. } => "release-funds",
            Self::Notify { .. } => "notify",
            Self::UpdateStatus { .. } => "update-status",
            Self::Unknown => "unknown",
        }
    }
}
