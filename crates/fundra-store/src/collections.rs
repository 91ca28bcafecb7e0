//! Collection names and typed helpers for the entities the engine touches.
//!
//! The generic [`RecordStore`] methods take collection names as strings;
//! everything engine-side goes through these helpers instead so a typo'd
//! collection name cannot slip in.

use fundra_core::{
    EvaluationRecord, Investment, Milestone, Notification, Project, RecordId, Rule, Transaction,
    User, Verification,
};

use crate::client::RecordStore;
use crate::error::StoreError;

pub const PROJECTS: &str = "projects";
pub const MILESTONES: &str = "milestones";
pub const INVESTMENTS: &str = "investments";
pub const VERIFICATIONS: &str = "verifications";
pub const USERS: &str = "users";
pub const NOTIFICATIONS: &str = "notifications";
pub const TRANSACTIONS: &str = "transactions";
pub const RULES: &str = "rules";
pub const EVALUATIONS: &str = "evaluations";

impl RecordStore {
    pub async fn project(&self, id: &RecordId) -> Result<Project, StoreError> {
        self.get(PROJECTS, id.as_str()).await
    }

    pub async fn try_project(&self, id: &RecordId) -> Result<Option<Project>, StoreError> {
        self.try_get(PROJECTS, id.as_str()).await
    }

    pub async fn user(&self, id: &RecordId) -> Result<User, StoreError> {
        self.get(USERS, id.as_str()).await
    }

    /// All users holding the admin role.
    pub async fn admins(&self) -> Result<Vec<User>, StoreError> {
        self.list(USERS, &[("role", "admin")]).await
    }

    /// A project's active rules, in store order.
    pub async fn active_rules(&self, project_id: &RecordId) -> Result<Vec<Rule>, StoreError> {
        self.list(
            RULES,
            &[("projectId", project_id.as_str()), ("active", "true")],
        )
        .await
    }

    pub async fn project_milestones(
        &self,
        project_id: &RecordId,
    ) -> Result<Vec<Milestone>, StoreError> {
        self.list(MILESTONES, &[("projectId", project_id.as_str())])
            .await
    }

    pub async fn project_verifications(
        &self,
        project_id: &RecordId,
    ) -> Result<Vec<Verification>, StoreError> {
        self.list(VERIFICATIONS, &[("projectId", project_id.as_str())])
            .await
    }

    pub async fn project_investments(
        &self,
        project_id: &RecordId,
    ) -> Result<Vec<Investment>, StoreError> {
        self.list(INVESTMENTS, &[("projectId", project_id.as_str())])
            .await
    }

    /// Fresh read of one investment (used for the check-and-set before a
    /// phase release).
    pub async fn investment(&self, id: &RecordId) -> Result<Investment, StoreError> {
        self.get(INVESTMENTS, id.as_str()).await
    }

    /// Persist a fully-updated investment record.
    pub async fn save_investment(&self, investment: &Investment) -> Result<Investment, StoreError> {
        self.replace(INVESTMENTS, investment.id.as_str(), investment)
            .await
    }

    /// Append an immutable transaction record.
    pub async fn record_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Transaction, StoreError> {
        self.create(TRANSACTIONS, transaction).await
    }

    /// Deliver one notification record.
    pub async fn push_notification(
        &self,
        notification: &Notification,
    ) -> Result<Notification, StoreError> {
        self.create(NOTIFICATIONS, notification).await
    }

    /// Append an evaluation audit record.
    pub async fn append_evaluation(
        &self,
        record: &EvaluationRecord,
    ) -> Result<EvaluationRecord, StoreError> {
        self.create(EVALUATIONS, record).await
    }

    /// Patch just the status field of a record in any collection.
    pub async fn patch_status(
        &self,
        collection: &str,
        id: &RecordId,
        status: &str,
    ) -> Result<serde_json::Value, StoreError> {
        self.patch(
            collection,
            id.as_str(),
            &serde_json::json!({ "status": status }),
        )
        .await
    }
}
