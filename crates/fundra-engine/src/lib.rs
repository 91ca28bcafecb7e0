//! # fundra-engine — Automated Escrow Release
//!
//! Decides, for a funded project, when and how much of an investor's
//! escrowed capital is released to the project creator, then carries out the
//! release, records an immutable audit trail, and notifies affected parties.
//!
//! - **Error** ([`error`]): structured error hierarchy and the propagation
//!   policy (conditions fail closed, actions capture failures per-action).
//!
//! - **Context** ([`context`]): the read-only per-run snapshot of a
//!   project's state.
//!
//! - **Conditions** ([`conditions`]): predicate evaluation — milestone
//!   completion, verification counts, elapsed time, external signals,
//!   funding thresholds.
//!
//! - **Providers** ([`providers`]): pluggable external condition lookups
//!   with their own timeouts.
//!
//! - **Actions** ([`actions`]): fund release with check-and-set discipline,
//!   notification dispatch, status mutation.
//!
//! - **Processor** ([`processor`]): the per-rule evaluate → record → act
//!   pipeline.
//!
//! - **Runner** ([`runner`]): project-level fan-out over rule targets; the
//!   platform's entry point.
//!
//! - **Schedule** ([`schedule`]): interval-driven re-evaluation for
//!   time-based conditions.

pub mod actions;
pub mod conditions;
pub mod context;
pub mod error;
pub mod processor;
pub mod providers;
pub mod runner;
pub mod schedule;
pub mod templates;

// Re-export primary types for ergonomic imports.

pub use error::{ActionError, EngineError, ProviderError};

pub use context::EvaluationContext;

pub use conditions::{ConditionEvaluator, ConditionReport};

pub use providers::{
    ExternalConditionProvider, ProviderRegistry, RepoTagProvider, StaticProvider, WebsiteProvider,
};

pub use actions::{ActionExecutor, ActionOutcome, ActionResult, ReleaseSummary, AMOUNT_TOLERANCE};

pub use processor::{RuleOutcome, RuleProcessor};

pub use runner::ProjectRuleRunner;

pub use schedule::ScheduledRunner;
