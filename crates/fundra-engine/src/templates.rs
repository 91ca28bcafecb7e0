//! # Notification Templates
//!
//! Message rendering for `notify` actions. Templates are referenced by name
//! from rule definitions; anything outside the known set renders the generic
//! text rather than failing the action.

use crate::actions::ReleaseSummary;
use crate::context::EvaluationContext;

pub const FUNDS_RELEASED: &str = "funds_released";
pub const MILESTONE_VERIFIED: &str = "milestone_verified";
pub const PENDING_VERIFICATION: &str = "pending_verification";

/// Render the message body for a template name.
///
/// `release` carries the outcome of a `release-funds` action that ran
/// earlier in the same rule, so a funds-released notice can name the actual
/// amount and destination.
pub fn render(
    template: &str,
    ctx: &EvaluationContext,
    release: Option<&ReleaseSummary>,
) -> String {
    let project = &ctx.project.title;
    match template {
        FUNDS_RELEASED => match release {
            Some(r) => format!(
                "Funds released for \"{project}\": {:.2} sent to {} (phase {}).",
                r.amount, r.to_wallet, r.phase
            ),
            None => format!("Funds released for \"{project}\"."),
        },
        MILESTONE_VERIFIED => match &ctx.target_milestone {
            Some(m) => format!(
                "Milestone \"{}\" on \"{project}\" has been verified and approved.",
                m.title
            ),
            None => format!("A milestone on \"{project}\" has been verified and approved."),
        },
        PENDING_VERIFICATION => match &ctx.target_milestone {
            Some(m) => format!(
                "Milestone \"{}\" on \"{project}\" is awaiting verification.",
                m.title
            ),
            None => format!("A milestone on \"{project}\" is awaiting verification."),
        },
        other => format!("Update on \"{project}\": {other}."),
    }
}
