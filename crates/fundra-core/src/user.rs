//! # Users and Notifications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::RecordId;

/// Platform role of a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Creator,
    Investor,
    /// Any role string this crate does not model.
    #[serde(untagged)]
    Other(String),
}

impl Role {
    /// The canonical string name, as stored in the `users` collection.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Creator => "creator",
            Self::Investor => "investor",
            Self::Other(role) => role,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A platform user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    /// Payout wallet; absent until the user connects one.
    #[serde(default)]
    pub wallet_address: Option<String>,
}

/// An in-app notification delivered to one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Store-assigned on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub user_id: RecordId,
    /// Template name the message was rendered from.
    pub template: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
