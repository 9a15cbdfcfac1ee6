//! Word and translation suggestion workflow.
//!
//! # Responsibility
//! - Record a user's new word, joining an existing suggestion when the
//!   normalized text is already proposed.
//! - Record a proposed translation: link two accepted words directly, or
//!   park the pair as a pre-translation on the side that still needs review.
//!
//! # Invariants
//! - Every call runs inside one immediate transaction.
//! - A user earns rating only when the call actually added their contribution.

use crate::config::RatingPolicy;
use crate::model::language::Language;
use crate::model::user::UserId;
use crate::model::word::{
    validate_word_text, AcceptedWord, PreTranslation, SuggestedWord, SuggestionStatus, ValidWord,
    WordDraft, WordId,
};
use crate::repo::suggestion_repo::{SqliteSuggestionRepository, SuggestionRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::word_repo::{LinkChange, RepoResult, SqliteWordRepository, WordRepository};
use crate::service::error::VocabularyResult;
use crate::service::guard::{begin_immediate, require_accepted, require_suggestion, require_user};
use log::debug;
use rusqlite::Connection;
use serde::Serialize;

/// Result of [`SuggestTranslationHandler::suggest_word`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SuggestWordOutcome {
    /// The word is already in the dictionary; nothing was stored.
    AlreadyAccepted { word: AcceptedWord },
    /// An open or reopened suggestion with the same text exists.
    Joined {
        suggestion: SuggestedWord,
        contributor_added: bool,
        /// The suggestion had been rejected and is open again.
        reopened: bool,
    },
    Created { suggestion: SuggestedWord },
}

/// Result of [`SuggestTranslationHandler::suggest_translation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TranslationOutcome {
    /// Both words are accepted and are now linked.
    Linked {
        word: AcceptedWord,
        translation: AcceptedWord,
        new_link: bool,
    },
    /// The source is accepted; the translation waits for review and
    /// carries the source as a pre-translation.
    PendingTranslation {
        word: AcceptedWord,
        suggestion: SuggestedWord,
    },
    /// The source itself waits for review and carries the proposed text.
    PendingSource { suggestion: SuggestedWord },
}

/// What [`upsert_suggestion`] did to the suggested collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SuggestionUpsert {
    pub id: WordId,
    pub created: bool,
    pub reopened: bool,
    pub contributor_added: bool,
}

/// Handler for the suggest-word and suggest-translation use cases.
pub struct SuggestTranslationHandler<'conn> {
    conn: &'conn Connection,
    rating: RatingPolicy,
}

impl<'conn> SuggestTranslationHandler<'conn> {
    pub fn new(conn: &'conn Connection, rating: RatingPolicy) -> Self {
        Self { conn, rating }
    }

    /// Proposes a single word for the dictionary.
    ///
    /// # Errors
    /// - `Validation` for empty or overlong text, blank dialect or theme.
    /// - `UserNotFound` when `user` never registered.
    pub fn suggest_word(
        &self,
        user: UserId,
        draft: &WordDraft,
    ) -> VocabularyResult<SuggestWordOutcome> {
        let word = draft.validate()?;

        let tx = begin_immediate(self.conn)?;
        let users = SqliteUserRepository::try_new(&tx)?;
        let words = SqliteWordRepository::try_new(&tx)?;
        let suggestions = SqliteSuggestionRepository::try_new(&tx)?;
        require_user(&users, user)?;

        let outcome = match words.find_accepted(word.language, &word.normalized_text)? {
            Some(accepted) => SuggestWordOutcome::AlreadyAccepted { word: accepted },
            None => {
                let upsert = upsert_suggestion(&suggestions, &word, Some(user))?;
                if upsert.contributor_added {
                    users.adjust_rating(user, self.rating.suggest_word)?;
                }
                let suggestion = require_suggestion(&suggestions, upsert.id)?;
                if upsert.created {
                    SuggestWordOutcome::Created { suggestion }
                } else {
                    SuggestWordOutcome::Joined {
                        suggestion,
                        contributor_added: upsert.contributor_added,
                        reopened: upsert.reopened,
                    }
                }
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    /// Proposes `translation_text` as a translation of `source`.
    ///
    /// The translation is always in the opposite language of the source.
    pub fn suggest_translation(
        &self,
        user: UserId,
        source: &WordDraft,
        translation_text: &str,
    ) -> VocabularyResult<TranslationOutcome> {
        let source = source.validate()?;
        let target_language = source.language.opposite();
        let translation = bare_word(target_language, translation_text)?;

        let tx = begin_immediate(self.conn)?;
        let users = SqliteUserRepository::try_new(&tx)?;
        let words = SqliteWordRepository::try_new(&tx)?;
        let suggestions = SqliteSuggestionRepository::try_new(&tx)?;
        require_user(&users, user)?;

        let source_word = words.find_accepted(source.language, &source.normalized_text)?;
        let target_word = words.find_accepted(target_language, &translation.normalized_text)?;

        let (outcome, contributed) = match (source_word, target_word) {
            (Some(word), Some(target)) => {
                let change = words.link_translation(&word, &target, Some(user))?;
                let outcome = TranslationOutcome::Linked {
                    word: require_accepted(&words, word.uuid)?,
                    translation: require_accepted(&words, target.uuid)?,
                    new_link: change == LinkChange::Created,
                };
                (outcome, change.is_change())
            }
            (Some(word), None) => {
                let upsert = upsert_suggestion(&suggestions, &translation, Some(user))?;
                let pre_added = suggestions
                    .add_pre_translation(upsert.id, &pre_translation_of(&word, user))?;
                let outcome = TranslationOutcome::PendingTranslation {
                    word,
                    suggestion: require_suggestion(&suggestions, upsert.id)?,
                };
                (outcome, upsert.contributor_added || pre_added)
            }
            (None, _) => {
                let upsert = upsert_suggestion(&suggestions, &source, Some(user))?;
                let pre = PreTranslation::new(
                    translation.text.clone(),
                    translation.normalized_text.clone(),
                    Some(user),
                );
                let pre_added = suggestions.add_pre_translation(upsert.id, &pre)?;
                let outcome = TranslationOutcome::PendingSource {
                    suggestion: require_suggestion(&suggestions, upsert.id)?,
                };
                (outcome, upsert.contributor_added || pre_added)
            }
        };

        if contributed {
            users.adjust_rating(user, self.rating.suggest_translation)?;
        }

        tx.commit()?;
        Ok(outcome)
    }
}

/// Inserts a suggestion or merges into the one with the same text.
///
/// A rejected suggestion is reopened as `new` with its votes cleared.
pub(crate) fn upsert_suggestion<S: SuggestionRepository>(
    suggestions: &S,
    word: &ValidWord,
    contributor: Option<UserId>,
) -> RepoResult<SuggestionUpsert> {
    let Some(existing) = suggestions.find_suggested(word.language, &word.normalized_text)? else {
        let id = suggestions.insert_suggested(word, contributor)?;
        return Ok(SuggestionUpsert {
            id,
            created: true,
            reopened: false,
            contributor_added: contributor.is_some(),
        });
    };

    let reopened = !existing.status.is_open();
    if reopened {
        suggestions.set_status(existing.uuid, SuggestionStatus::New)?;
        let cleared = suggestions.clear_votes(existing.uuid)?;
        debug!(
            "event=suggestion_reopen module=vocabulary status=ok cleared_votes={}",
            cleared
        );
    }

    let contributor_added = match contributor {
        Some(user) => suggestions.add_suggested_contributor(existing.uuid, user)?,
        None => false,
    };
    suggestions.add_suggested_themes(existing.uuid, &word.themes)?;
    if let Some(dialect) = &word.dialect {
        suggestions.fill_suggested_dialect(existing.uuid, dialect)?;
    }

    Ok(SuggestionUpsert {
        id: existing.uuid,
        created: false,
        reopened,
        contributor_added,
    })
}

/// Validated word without dialect or themes, as carried by a translation.
pub(crate) fn bare_word(language: Language, text: &str) -> VocabularyResult<ValidWord> {
    let (text, normalized_text) = validate_word_text(language, text)?;
    Ok(ValidWord {
        language,
        text,
        normalized_text,
        dialect: None,
        themes: Vec::new(),
    })
}

fn pre_translation_of(word: &AcceptedWord, user: UserId) -> PreTranslation {
    PreTranslation::new(word.text.clone(), word.normalized_text.clone(), Some(user))
}
