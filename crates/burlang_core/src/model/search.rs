//! Search audit trail records.

use crate::model::language::Language;
use crate::model::user::UserId;
use crate::model::word::WordId;
use serde::{Deserialize, Serialize};

/// Distinct normalized query, counted across all users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchedWord {
    pub uuid: WordId,
    pub language: Language,
    /// Text as first typed.
    pub text: String,
    pub normalized_text: String,
    pub search_count: i64,
}

/// Dynamic reference to an accepted word of either language.
///
/// Resolved at read time; the target may no longer exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundTranslation {
    pub language: Language,
    pub word: WordId,
}

/// One lookup made by one user (or anonymously).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: i64,
    pub searched: WordId,
    pub language: Language,
    pub text: String,
    pub user: Option<UserId>,
    pub found: Option<FoundTranslation>,
    pub created_at: i64,
}
