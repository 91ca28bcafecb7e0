//! # Action Execution
//!
//! Side-effecting operations against the record store, run only after a
//! rule's required conditions all passed. Actions execute in declaration
//! order, each fully resolved (including error capture) before the next
//! starts — a `release-funds` result may feed a later `notify` message.
//! One action failing never prevents its siblings from running.
//!
//! ## Release discipline
//!
//! A release locates the single unreleased phase whose size matches the
//! computed amount within [`AMOUNT_TOLERANCE`]. Zero matches or more than
//! one are hard failures — the engine never guesses which tranche to pay.
//! The phase update is a check-and-set: the investment is re-read
//! immediately before the write and the release is rejected if the phase
//! flipped to released in between. The phase update and the transaction
//! record are one logical unit; if the transaction write fails after the
//! phase update persisted, the result is the distinct
//! [`ActionOutcome::ReleasedWithAuditGap`], not plain success.

use std::collections::BTreeSet;

use chrono::Utc;
use fundra_core::{
    Action, Investment, Notification, NotifyTarget, RecordId, TargetEntity, Transaction,
    ESCROW_ACCOUNT, PROJECT_OWNER_WALLET,
};
use serde::{Deserialize, Serialize};

use crate::context::EvaluationContext;
use crate::error::ActionError;
use crate::templates;

/// Matching tolerance between a computed release amount and a phase's size,
/// in currency units. Absorbs percentage-of-investment rounding.
pub const AMOUNT_TOLERANCE: f64 = 0.01;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// What a completed `release-funds` actually did.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseSummary {
    pub investment_id: RecordId,
    /// Label of the released phase.
    pub phase: String,
    pub amount: f64,
    pub to_wallet: String,
    /// Missing exactly when the transaction write failed (audit gap).
    pub transaction_id: Option<RecordId>,
}

/// Terminal outcome of one action.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    Succeeded {
        detail: serde_json::Value,
    },
    Failed {
        error: String,
    },
    /// Funds moved but the ledger write failed; an operator must reconcile.
    ReleasedWithAuditGap {
        release: ReleaseSummary,
        error: String,
    },
}

impl ActionOutcome {
    /// Plain success only — an audit gap is not success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Per-action outcome, reported back to the caller, never silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    /// Kind label of the action (e.g. `release-funds`).
    pub action: String,
    #[serde(flatten)]
    pub outcome: ActionOutcome,
}

// ---------------------------------------------------------------------------
// Phase matching
// ---------------------------------------------------------------------------

/// Find the unique unreleased phase sized at `amount` (within tolerance).
pub(crate) fn match_unreleased_phase(
    investment: &Investment,
    amount: f64,
) -> Result<usize, ActionError> {
    let matches: Vec<usize> = investment
        .unreleased_phases()
        .into_iter()
        .filter(|(_, phase_amount)| (phase_amount - amount).abs() <= AMOUNT_TOLERANCE)
        .map(|(i, _)| i)
        .collect();

    match matches.len() {
        0 => Err(ActionError::PhaseNotFound { amount }),
        1 => Ok(matches[0]),
        count => Err(ActionError::AmbiguousPhase { amount, count }),
    }
}

// ---------------------------------------------------------------------------
// ActionExecutor
// ---------------------------------------------------------------------------

/// Executes a rule's actions against the store.
#[derive(Debug, Default)]
pub struct ActionExecutor;

impl ActionExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute a single action in isolation (no preceding release context).
    pub async fn execute(&self, action: &Action, ctx: &EvaluationContext) -> ActionResult {
        let mut last_release = None;
        let outcome = self.execute_with_state(action, ctx, &mut last_release).await;
        ActionResult {
            action: action.label().to_string(),
            outcome,
        }
    }

    /// Execute all actions in order, collecting every result.
    pub async fn execute_all(
        &self,
        actions: &[Action],
        ctx: &EvaluationContext,
    ) -> Vec<ActionResult> {
        let mut results = Vec::with_capacity(actions.len());
        let mut last_release: Option<ReleaseSummary> = None;

        for action in actions {
            let outcome = self.execute_with_state(action, ctx, &mut last_release).await;
            if let ActionOutcome::Failed { error } = &outcome {
                tracing::warn!(
                    project = %ctx.project.id,
                    action = action.label(),
                    "action failed: {error}"
                );
            }
            results.push(ActionResult {
                action: action.label().to_string(),
                outcome,
            });
        }

        results
    }

    async fn execute_with_state(
        &self,
        action: &Action,
        ctx: &EvaluationContext,
        last_release: &mut Option<ReleaseSummary>,
    ) -> ActionOutcome {
        match action {
            Action::ReleaseFunds {
                amount,
                percentage,
                target_wallet,
                note,
            } => match self
                .release_funds(*amount, *percentage, target_wallet, note.as_deref(), ctx)
                .await
            {
                Ok((release, audit_gap)) => {
                    *last_release = Some(release.clone());
                    match audit_gap {
                        None => ActionOutcome::Succeeded {
                            detail: serde_json::json!({
                                "releasedAmount": release.amount,
                                "phase": release.phase,
                                "toWallet": release.to_wallet,
                                "transactionId": release.transaction_id,
                            }),
                        },
                        Some(error) => ActionOutcome::ReleasedWithAuditGap { release, error },
                    }
                }
                Err(e) => ActionOutcome::Failed {
                    error: e.to_string(),
                },
            },

            Action::Notify { targets, template } => {
                self.notify(targets, template, ctx, last_release.as_ref())
                    .await
            }

            Action::UpdateStatus {
                entity,
                entity_id,
                status,
            } => match self
                .update_status(*entity, entity_id.as_ref(), status, ctx)
                .await
            {
                Ok(detail) => ActionOutcome::Succeeded { detail },
                Err(e) => ActionOutcome::Failed {
                    error: e.to_string(),
                },
            },

            Action::Unknown => ActionOutcome::Failed {
                error: ActionError::UnsupportedAction.to_string(),
            },
        }
    }

    /// Release one disbursement phase. On success returns the summary and,
    /// if the transaction write failed after the phase update persisted, the
    /// audit-gap error message.
    async fn release_funds(
        &self,
        amount: Option<f64>,
        percentage: Option<f64>,
        target_wallet: &str,
        note: Option<&str>,
        ctx: &EvaluationContext,
    ) -> Result<(ReleaseSummary, Option<String>), ActionError> {
        let investment = ctx
            .target_investment
            .as_ref()
            .ok_or(ActionError::NoTargetInvestment)?;

        let release_amount = amount
            .or_else(|| percentage.map(|pct| investment.amount * pct / 100.0))
            .ok_or(ActionError::UnsizedRelease)?;

        // Match against the snapshot first so a stale schedule fails before
        // any lookup work happens.
        let phase_idx = match_unreleased_phase(investment, release_amount)?;
        let phase_label = investment.disbursement_phases[phase_idx].phase.clone();

        // Resolve the destination before touching any state.
        let to_wallet = self.resolve_wallet(target_wallet, ctx).await?;

        // Check-and-set: re-read the investment and require the phase to
        // still be unreleased at write time.
        let mut fresh = ctx.store().investment(&investment.id).await?;
        let investment_id = fresh.id.clone();
        let total = fresh.amount;
        let released_before = fresh.released_total();

        let phase = fresh
            .disbursement_phases
            .iter_mut()
            .find(|p| p.phase == phase_label)
            .ok_or(ActionError::PhaseNotFound {
                amount: release_amount,
            })?;
        if phase.released {
            return Err(ActionError::ConcurrentRelease { phase: phase_label });
        }
        if released_before + release_amount > total + AMOUNT_TOLERANCE {
            return Err(ActionError::OverRelease {
                investment_id,
                amount: release_amount,
                released: released_before,
                total,
            });
        }

        let now = Utc::now();
        phase.released = true;
        phase.release_date = Some(now);
        phase.release_note = note.map(String::from);

        ctx.store().save_investment(&fresh).await?;

        let transaction = Transaction {
            id: None,
            project_id: ctx.project.id.clone(),
            investment_id: investment_id.clone(),
            phase: phase_label.clone(),
            amount: release_amount,
            from_account: ESCROW_ACCOUNT.to_string(),
            to_wallet: to_wallet.clone(),
            note: note.map(String::from),
            created_at: now,
        };

        let mut release = ReleaseSummary {
            investment_id,
            phase: phase_label.clone(),
            amount: release_amount,
            to_wallet,
            transaction_id: None,
        };

        match ctx.store().record_transaction(&transaction).await {
            Ok(stored) => {
                release.transaction_id = stored.id;
                tracing::info!(
                    project = %ctx.project.id,
                    investment = %release.investment_id,
                    phase = %release.phase,
                    amount = release.amount,
                    "released disbursement phase"
                );
                Ok((release, None))
            }
            Err(e) => {
                // The phase update persisted; the ledger did not. Surface
                // the gap so an operator can reconcile.
                let gap = ActionError::ReleaseRecordedWithAuditGap {
                    phase: phase_label,
                    amount: release_amount,
                    source: e,
                };
                tracing::error!(
                    project = %ctx.project.id,
                    investment = %release.investment_id,
                    "{gap}"
                );
                Ok((release, Some(gap.to_string())))
            }
        }
    }

    async fn resolve_wallet(
        &self,
        target_wallet: &str,
        ctx: &EvaluationContext,
    ) -> Result<String, ActionError> {
        if target_wallet != PROJECT_OWNER_WALLET {
            return Ok(target_wallet.to_string());
        }
        let owner = ctx.store().user(&ctx.project.owner_id).await?;
        owner
            .wallet_address
            .ok_or(ActionError::WalletNotResolved { user_id: owner.id })
    }

    /// Write one notification per resolved recipient. Partial delivery is a
    /// success with counts, not a hard failure.
    async fn notify(
        &self,
        targets: &[NotifyTarget],
        template: &str,
        ctx: &EvaluationContext,
        last_release: Option<&ReleaseSummary>,
    ) -> ActionOutcome {
        let mut recipients: BTreeSet<RecordId> = BTreeSet::new();
        let mut admin_lookup_error: Option<String> = None;

        for target in targets {
            match target {
                NotifyTarget::ProjectOwner => {
                    recipients.insert(ctx.project.owner_id.clone());
                }
                NotifyTarget::Investors => {
                    recipients.extend(ctx.investments.iter().map(|i| i.investor_id.clone()));
                }
                NotifyTarget::Admin => match ctx.store().admins().await {
                    Ok(admins) => recipients.extend(admins.into_iter().map(|u| u.id)),
                    Err(e) => {
                        tracing::warn!(
                            project = %ctx.project.id,
                            "admin recipient lookup failed: {e}"
                        );
                        admin_lookup_error = Some(e.to_string());
                    }
                },
                NotifyTarget::Other(name) => {
                    tracing::warn!(
                        project = %ctx.project.id,
                        target = %name,
                        "unrecognized notify target skipped"
                    );
                }
            }
        }

        let message = templates::render(template, ctx, last_release);
        let now = Utc::now();
        let mut delivered: u32 = 0;
        let mut failed: u32 = 0;

        for user_id in &recipients {
            let notification = Notification {
                id: None,
                user_id: user_id.clone(),
                template: template.to_string(),
                message: message.clone(),
                read: false,
                created_at: now,
            };
            match ctx.store().push_notification(&notification).await {
                Ok(_) => delivered += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        project = %ctx.project.id,
                        user = %user_id,
                        "notification write failed: {e}"
                    );
                }
            }
        }

        if !recipients.is_empty() && delivered == 0 {
            return ActionOutcome::Failed {
                error: format!("all {failed} notification writes failed"),
            };
        }

        let mut detail = serde_json::json!({
            "template": template,
            "recipientCount": delivered,
        });
        if failed > 0 {
            detail["failedCount"] = serde_json::json!(failed);
        }
        if let Some(err) = admin_lookup_error {
            detail["adminLookupError"] = serde_json::json!(err);
        }
        ActionOutcome::Succeeded { detail }
    }

    async fn update_status(
        &self,
        entity: TargetEntity,
        entity_id: Option<&RecordId>,
        status: &str,
        ctx: &EvaluationContext,
    ) -> Result<serde_json::Value, ActionError> {
        let id = entity_id
            .cloned()
            .or_else(|| match entity {
                TargetEntity::Project => Some(ctx.project.id.clone()),
                TargetEntity::Milestone => ctx.target_milestone.as_ref().map(|m| m.id.clone()),
                TargetEntity::Investment => ctx.target_investment.as_ref().map(|i| i.id.clone()),
            })
            .ok_or(ActionError::EntityNotResolved {
                entity: entity.collection(),
            })?;

        ctx.store()
            .patch_status(entity.collection(), &id, status)
            .await?;

        Ok(serde_json::json!({
            "entity": entity.collection(),
            "id": id,
            "status": status,
        }))
    }
}
