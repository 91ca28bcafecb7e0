//! # Projects, Milestones, Verifications
//!
//! The funded-project side of the data model. Milestone status carries real
//! semantics for the rule engine (a `milestone-completed` condition requires
//! both completion and administrative approval); project and investment
//! status strings are platform-managed and treated as opaque here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::RecordId;

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A crowdfunding project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Store-assigned identifier.
    pub id: RecordId,
    /// The project creator.
    pub owner_id: RecordId,
    /// Human-readable project title.
    pub title: String,
    /// Platform-managed lifecycle status (opaque to the engine).
    #[serde(default)]
    pub status: String,
    /// Total funding target.
    pub funding_goal: f64,
    /// Funding raised so far.
    #[serde(default)]
    pub current_funding: f64,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Current funding as a percentage of the goal.
    ///
    /// A zero or negative goal yields 0.0 rather than dividing by zero — a
    /// funding condition against such a project never passes on percentage.
    pub fn funding_percent(&self) -> f64 {
        if self.funding_goal <= 0.0 {
            return 0.0;
        }
        self.current_funding / self.funding_goal * 100.0
    }
}

// ---------------------------------------------------------------------------
// Milestone
// ---------------------------------------------------------------------------

/// Milestone lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Pending,
    InProgress,
    Completed,
    /// Any status string this crate does not model (the platform app owns
    /// the full set). Preserved verbatim so a replace round-trips.
    #[serde(untagged)]
    Other(String),
}

impl MilestoneStatus {
    /// The canonical string name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Other(status) => status,
        }
    }
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project milestone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: RecordId,
    pub project_id: RecordId,
    pub title: String,
    pub status: MilestoneStatus,
    /// Administrative sign-off on the completed work.
    #[serde(default)]
    pub admin_approved: bool,
    /// When the milestone was completed, if it has been.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Milestone {
    /// Whether this milestone counts as done for release purposes:
    /// completed AND administratively approved.
    pub fn is_completed_and_approved(&self) -> bool {
        self.status == MilestoneStatus::Completed && self.admin_approved
    }
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// A third-party verification of milestone work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub id: RecordId,
    pub project_id: RecordId,
    /// The milestone this verification applies to, if scoped to one.
    #[serde(default)]
    pub milestone_id: Option<RecordId>,
    /// Who performed the verification.
    #[serde(default)]
    pub verifier_id: Option<RecordId>,
    pub verified_at: DateTime<Utc>,
}
