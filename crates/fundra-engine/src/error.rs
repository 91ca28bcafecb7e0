//! Structured error hierarchy for the rule engine.
//!
//! Propagation policy: condition evaluation never throws outward (it fails
//! closed to "not met"); action failures are captured per-action into the
//! action's result, so one bad action cannot abort its siblings. The one
//! place an error crosses the engine boundary is [`EngineError`] from the
//! runner and processor entry points — project-not-found aborts a run, and
//! an empty condition set on a rule is a definition error the processor
//! refuses to evaluate (a rule that releases funds on vacuous truth must
//! never execute).

use fundra_core::RecordId;
use fundra_store::StoreError;

/// Errors that abort a processing call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The project the run was asked for does not exist.
    #[error("project not found: {project_id}")]
    ProjectNotFound { project_id: RecordId },

    /// The rule defines no conditions; it cannot gate fund movement.
    #[error("rule {rule_id} has no conditions and cannot be evaluated")]
    EmptyConditionSet { rule_id: RecordId },

    /// The store failed while loading the run's context.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-action failures, captured into the action's result.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// A release action ran without an investment in scope.
    #[error("no investment in scope for release-funds")]
    NoTargetInvestment,

    /// A release action specified neither an amount nor a percentage.
    #[error("release-funds specifies neither amount nor percentage")]
    UnsizedRelease,

    /// No unreleased disbursement phase matches the computed amount.
    #[error("no unreleased disbursement phase matches amount {amount:.2}")]
    PhaseNotFound { amount: f64 },

    /// More than one unreleased phase matches the computed amount. Guessing
    /// which to release is forbidden.
    #[error("{count} unreleased phases match amount {amount:.2}; ambiguous release refused")]
    AmbiguousPhase { amount: f64, count: usize },

    /// The matched phase was released by another run between our read and
    /// our write.
    #[error("phase {phase:?} was released concurrently")]
    ConcurrentRelease { phase: String },

    /// Releasing would push the released total past the investment amount.
    #[error(
        "releasing {amount:.2} would exceed investment {investment_id} \
         ({released:.2} of {total:.2} already released)"
    )]
    OverRelease {
        investment_id: RecordId,
        amount: f64,
        released: f64,
        total: f64,
    },

    /// The phase update persisted but the transaction record write failed.
    /// The release happened; the ledger has a gap an operator must
    /// reconcile.
    #[error("released {amount:.2} from phase {phase:?} but failed to record the transaction: {source}")]
    ReleaseRecordedWithAuditGap {
        phase: String,
        amount: f64,
        #[source]
        source: StoreError,
    },

    /// The destination wallet could not be resolved.
    #[error("no wallet connected for user {user_id}")]
    WalletNotResolved { user_id: RecordId },

    /// No entity id could be determined for a status update.
    #[error("cannot resolve a {entity} id for update-status")]
    EntityNotResolved { entity: &'static str },

    /// The action kind is not implemented in this build.
    #[error("unsupported action kind")]
    UnsupportedAction,

    /// A store write failed before any state changed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from external condition providers. These never escape the
/// evaluator — a failed lookup means the condition is not met.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No provider is registered under the requested name.
    #[error("unknown external condition provider {provider:?}")]
    UnknownProvider { provider: String },

    /// The provider was reached but the lookup failed or timed out.
    #[error("provider {provider:?} lookup {condition:?} failed: {reason}")]
    LookupFailed {
        provider: String,
        condition: String,
        reason: String,
    },
}
