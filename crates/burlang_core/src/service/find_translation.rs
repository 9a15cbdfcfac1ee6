//! Dictionary lookup with search audit.

use crate::model::language::Language;
use crate::model::search::{FoundTranslation, SearchHistoryEntry};
use crate::model::user::UserId;
use crate::model::word::{validate_word_text, AcceptedWord};
use crate::repo::search_repo::{SearchRecord, SearchRepository, SqliteSearchRepository};
use crate::repo::user_repo::SqliteUserRepository;
use crate::repo::word_repo::{SqliteWordRepository, WordRepository};
use crate::service::error::VocabularyResult;
use crate::service::guard::{begin_immediate, require_user};
use rusqlite::Connection;
use serde::Serialize;

/// Lookup result. `word` is `None` when the text is not in the dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindTranslationResult {
    pub language: Language,
    pub query: String,
    pub normalized_text: String,
    pub word: Option<AcceptedWord>,
    pub translations: Vec<AcceptedWord>,
    pub history: SearchHistoryEntry,
}

pub struct FindTranslationHandler<'conn> {
    conn: &'conn Connection,
}

impl<'conn> FindTranslationHandler<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Looks up `text` and returns its linked translations.
    ///
    /// Every lookup, found or not, bumps the searched-word counter and
    /// appends a history row in the same transaction. Anonymous lookups
    /// pass `user = None`.
    pub fn find(
        &self,
        user: Option<UserId>,
        language: Language,
        text: &str,
    ) -> VocabularyResult<FindTranslationResult> {
        let (query, normalized_text) = validate_word_text(language, text)?;

        let tx = begin_immediate(self.conn)?;
        if let Some(user) = user {
            require_user(&SqliteUserRepository::try_new(&tx)?, user)?;
        }
        let words = SqliteWordRepository::try_new(&tx)?;
        let searches = SqliteSearchRepository::try_new(&tx)?;

        let word = words.find_accepted(language, &normalized_text)?;
        let translations = match &word {
            Some(word) => words.list_translations(word)?,
            None => Vec::new(),
        };
        let history = searches.record_search(&SearchRecord {
            language,
            text: &query,
            normalized_text: &normalized_text,
            user,
            found: word.as_ref().map(|word| FoundTranslation {
                language: word.language,
                word: word.uuid,
            }),
        })?;

        tx.commit()?;
        Ok(FindTranslationResult {
            language,
            query,
            normalized_text,
            word,
            translations,
            history,
        })
    }
}
