//! # Evaluation Audit Records
//!
//! One `EvaluationRecord` is appended for every rule evaluation attempt,
//! pass or fail, before any action runs. Records are individually digestable
//! for tamper-evidence: the digest is the SHA-256 of the record's JSON
//! encoding with the store-assigned id excluded, so a record digests the
//! same before and after the store assigns one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::id::RecordId;

/// Outcome of evaluating one condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionResult {
    /// Kind label of the condition (e.g. `project-funding`).
    pub condition: String,
    pub required: bool,
    pub met: bool,
}

/// Append-only audit entry for one rule evaluation attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    /// Store-assigned on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub rule_id: RecordId,
    pub project_id: RecordId,
    /// The milestone/investment the evaluation was scoped to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<RecordId>,
    pub evaluated_at: DateTime<Utc>,
    pub condition_results: Vec<ConditionResult>,
    pub conditions_met: u32,
    pub conditions_total: u32,
    pub passed: bool,
}

impl EvaluationRecord {
    /// SHA-256 hex digest of this record's canonical JSON encoding.
    ///
    /// Returns `None` if serialization fails, which well-formed records
    /// never do.
    pub fn digest(&self) -> Option<String> {
        let mut unidentified = self.clone();
        unidentified.id = None;
        let bytes = serde_json::to_vec(&unidentified).ok()?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Some(format!("{:x}", hasher.finalize()))
    }
}
