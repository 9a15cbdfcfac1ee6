//! Telegram contributor records.

use serde::{Deserialize, Serialize};

/// Telegram user id; also the primary key of `telegram_users`.
pub type UserId = i64;

/// Capability granted to a user on top of contributing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Accept, decline and unlink.
    Moderate,
    /// Manage permissions of other users. Implies `Moderate`.
    Admin,
}

impl Permission {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Moderate => "moderate",
            Self::Admin => "admin",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "moderate" => Some(Self::Moderate),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub rating: i64,
    /// Sorted, without duplicates.
    pub permissions: Vec<Permission>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TelegramUser {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.contains(&Permission::Admin) || self.permissions.contains(&permission)
    }
}
