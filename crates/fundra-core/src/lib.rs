//! # fundra-core — Platform Domain Records
//!
//! Shared record types for the Fundra crowdfunding platform, as they appear
//! in the generic record store:
//!
//! - **Id** ([`id`]): the `RecordId` newtype for store-assigned identifiers.
//!
//! - **Project** ([`project`]): projects, their milestones, and milestone
//!   verifications.
//!
//! - **Investment** ([`investment`]): investments with their scheduled
//!   disbursement phases, and the immutable transactions written when a
//!   phase is released.
//!
//! - **User** ([`user`]): platform users, roles, and notification records.
//!
//! - **Rule** ([`rule`]): escrow release rules — targeting, conditions, and
//!   actions consumed read-only by the rule engine.
//!
//! - **Evaluation** ([`evaluation`]): append-only audit records written for
//!   every rule evaluation attempt.
//!
//! This crate is pure data: no I/O, no engine logic.

pub mod evaluation;
pub mod id;
pub mod investment;
pub mod project;
pub mod rule;
pub mod user;

// Re-export primary types for ergonomic imports.

pub use id::RecordId;

pub use project::{Milestone, MilestoneStatus, Project, Verification};

pub use investment::{DisbursementPhase, Investment, Transaction, ESCROW_ACCOUNT};

pub use user::{Notification, Role, User};

pub use rule::{
    Action, Condition, ConditionKind, NotifyTarget, ReferenceEvent, Rule, RuleTarget, TargetEntity,
    PROJECT_OWNER_WALLET,
};

pub use evaluation::{ConditionResult, EvaluationRecord};
