//! # Investments, Disbursement Phases, Transactions
//!
//! An investment's escrowed capital is scheduled out in disbursement phases.
//! A phase is released at most once — `released` is terminal — and the sum of
//! released phase amounts never exceeds the investment amount. The engine
//! enforces both; the helpers here give it the numbers to do so.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Ledger name of the platform escrow account transactions draw from.
pub const ESCROW_ACCOUNT: &str = "escrow";

// ---------------------------------------------------------------------------
// DisbursementPhase
// ---------------------------------------------------------------------------

/// One scheduled tranche of an investment's escrowed funds.
///
/// Sized either by an absolute `amount` or by a `percentage` of the owning
/// investment. Once `released` is set it is never reverted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisbursementPhase {
    /// Phase label, unique within its investment (e.g. "phase-2").
    pub phase: String,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
    /// Human-readable description of the release condition.
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub released: bool,
    #[serde(default)]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub release_note: Option<String>,
}

// ---------------------------------------------------------------------------
// Investment
// ---------------------------------------------------------------------------

/// An investor's stake in a project, with its disbursement schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: RecordId,
    pub project_id: RecordId,
    pub investor_id: RecordId,
    /// Total invested amount held in escrow.
    pub amount: f64,
    /// Platform-managed lifecycle status (opaque to the engine).
    #[serde(default)]
    pub status: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub disbursement_phases: Vec<DisbursementPhase>,
}

impl Investment {
    /// Resolve the monetary size of a phase: its absolute `amount`, or its
    /// `percentage` of this investment. `None` if the phase specifies
    /// neither.
    pub fn phase_amount(&self, phase: &DisbursementPhase) -> Option<f64> {
        if let Some(amount) = phase.amount {
            return Some(amount);
        }
        phase.percentage.map(|pct| self.amount * pct / 100.0)
    }

    /// Sum of amounts across released phases.
    pub fn released_total(&self) -> f64 {
        self.disbursement_phases
            .iter()
            .filter(|p| p.released)
            .filter_map(|p| self.phase_amount(p))
            .sum()
    }

    /// Indices and sizes of phases not yet released.
    pub fn unreleased_phases(&self) -> Vec<(usize, f64)> {
        self.disbursement_phases
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.released)
            .filter_map(|(i, p)| self.phase_amount(p).map(|a| (i, a)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An immutable ledger record of an escrow release.
///
/// Written exactly once per released phase, after the phase update persists.
/// Never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Store-assigned on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub project_id: RecordId,
    pub investment_id: RecordId,
    /// Label of the released phase.
    pub phase: String,
    pub amount: f64,
    /// Source account (always [`ESCROW_ACCOUNT`] for releases).
    pub from_account: String,
    /// Destination wallet address.
    pub to_wallet: String,
    #[serde(default)]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
