//! Moderation of suggested words.
//!
//! # Responsibility
//! - Move a suggestion into the accepted dictionary, merging into an
//!   existing accepted word with the same normalized text.
//! - Resolve the suggestion's pre-translations into links or new
//!   suggestions on the opposite side.
//! - Decline suggestions, tally community votes, remove bad links.
//!
//! # Invariants
//! - Acceptance is atomic: the accepted word, its links, the deletion of
//!   the suggestion and every rating credit commit together or not at all.
//! - Only `new` and `processing` suggestions can be accepted, declined or voted on.

use crate::config::{ModerationPolicy, RatingPolicy};
use crate::model::user::{Permission, UserId};
use crate::model::word::{
    AcceptedWord, PreTranslation, SuggestedWord, SuggestionStatus, ValidWord, WordId,
};
use crate::repo::suggestion_repo::{
    SqliteSuggestionRepository, SuggestionRepository, VoteChange, VoteTally,
};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::word_repo::{SqliteWordRepository, WordRepository};
use crate::service::error::{VocabularyError, VocabularyResult};
use crate::service::guard::{
    begin_immediate, require_accepted, require_open_suggestion, require_permission,
    require_suggestion, require_user,
};
use crate::service::suggest::upsert_suggestion;
use log::debug;
use rusqlite::Connection;
use serde::Serialize;

/// Result of accepting a suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptanceOutcome {
    /// The accepted word after merge and link resolution.
    pub word: AcceptedWord,
    /// `true` when an accepted word with the same text already existed.
    pub merged: bool,
    /// Accepted words linked from pre-translations.
    pub linked: Vec<WordId>,
    /// Suggestions created or joined for pre-translations not yet accepted.
    pub pending: Vec<WordId>,
    /// Snapshot of the consumed suggestion, with status `accepted`.
    pub suggestion: SuggestedWord,
}

/// Result of one moderation vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VoteOutcome {
    /// Thresholds not reached yet.
    Recorded { first_vote: bool, tally: VoteTally },
    Accepted { acceptance: Box<AcceptanceOutcome> },
    Rejected { suggestion: SuggestedWord },
}

/// Handler for accept, decline, vote and unlink.
pub struct AcceptanceHandler<'conn> {
    conn: &'conn Connection,
    rating: RatingPolicy,
    moderation: ModerationPolicy,
}

impl<'conn> AcceptanceHandler<'conn> {
    pub fn new(
        conn: &'conn Connection,
        rating: RatingPolicy,
        moderation: ModerationPolicy,
    ) -> Self {
        Self {
            conn,
            rating,
            moderation,
        }
    }

    /// Accepts suggestion `id` on behalf of a moderator.
    ///
    /// # Errors
    /// - `PermissionDenied` without the `moderate` permission.
    /// - `SuggestionNotFound` / `SuggestionClosed`.
    pub fn accept(&self, moderator: UserId, id: WordId) -> VocabularyResult<AcceptanceOutcome> {
        let tx = begin_immediate(self.conn)?;
        let users = SqliteUserRepository::try_new(&tx)?;
        let moderator = require_user(&users, moderator)?;
        require_permission(&moderator, Permission::Moderate)?;

        let outcome = accept_suggestion(&tx, &self.rating, id)?;
        tx.commit()?;
        Ok(outcome)
    }

    /// Marks suggestion `id` as rejected. The row is kept so a later
    /// suggestion of the same text reopens it.
    pub fn decline(&self, moderator: UserId, id: WordId) -> VocabularyResult<SuggestedWord> {
        let tx = begin_immediate(self.conn)?;
        let users = SqliteUserRepository::try_new(&tx)?;
        let suggestions = SqliteSuggestionRepository::try_new(&tx)?;
        let moderator = require_user(&users, moderator)?;
        require_permission(&moderator, Permission::Moderate)?;

        require_open_suggestion(&suggestions, id)?;
        suggestions.set_status(id, SuggestionStatus::Rejected)?;
        let suggestion = require_suggestion(&suggestions, id)?;

        tx.commit()?;
        Ok(suggestion)
    }

    /// Records `user`'s vote and closes the suggestion once a threshold
    /// from [`ModerationPolicy`] is reached.
    ///
    /// # Errors
    /// - `SelfVote` when `user` authored the suggestion.
    pub fn vote(&self, user: UserId, id: WordId, approve: bool) -> VocabularyResult<VoteOutcome> {
        let tx = begin_immediate(self.conn)?;
        let users = SqliteUserRepository::try_new(&tx)?;
        let suggestions = SqliteSuggestionRepository::try_new(&tx)?;
        require_user(&users, user)?;

        let suggestion = require_open_suggestion(&suggestions, id)?;
        if suggestion.author == Some(user) {
            return Err(VocabularyError::SelfVote {
                user,
                suggestion: id,
            });
        }

        let change = suggestions.record_vote(id, user, approve)?;
        if change == VoteChange::First {
            users.adjust_rating(user, self.rating.moderation_vote)?;
        }
        if suggestion.status == SuggestionStatus::New {
            suggestions.set_status(id, SuggestionStatus::Processing)?;
        }

        let tally = suggestions.vote_tally(id)?;
        debug!(
            "event=suggestion_vote module=vocabulary status=ok approvals={} rejections={}",
            tally.approvals, tally.rejections
        );

        let outcome = if tally.approvals >= self.moderation.approvals_to_accept {
            VoteOutcome::Accepted {
                acceptance: Box::new(accept_suggestion(&tx, &self.rating, id)?),
            }
        } else if tally.rejections >= self.moderation.rejections_to_decline {
            suggestions.set_status(id, SuggestionStatus::Rejected)?;
            VoteOutcome::Rejected {
                suggestion: require_suggestion(&suggestions, id)?,
            }
        } else {
            VoteOutcome::Recorded {
                first_vote: change == VoteChange::First,
                tally,
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    /// Removes the link between two accepted words.
    ///
    /// Returns `word` as stored after the removal.
    pub fn unlink_translation(
        &self,
        moderator: UserId,
        word: WordId,
        translation: WordId,
    ) -> VocabularyResult<AcceptedWord> {
        let tx = begin_immediate(self.conn)?;
        let users = SqliteUserRepository::try_new(&tx)?;
        let words = SqliteWordRepository::try_new(&tx)?;
        let moderator = require_user(&users, moderator)?;
        require_permission(&moderator, Permission::Moderate)?;

        let first = require_accepted(&words, word)?;
        let second = require_accepted(&words, translation)?;
        if !words.unlink_translation(&first, &second)? {
            return Err(VocabularyError::LinkNotFound { word, translation });
        }
        let updated = require_accepted(&words, word)?;

        tx.commit()?;
        Ok(updated)
    }
}

/// Moves suggestion `id` into the accepted collection on `conn`.
///
/// The caller owns the transaction.
fn accept_suggestion(
    conn: &Connection,
    rating: &RatingPolicy,
    id: WordId,
) -> VocabularyResult<AcceptanceOutcome> {
    let users = SqliteUserRepository::try_new(conn)?;
    let words = SqliteWordRepository::try_new(conn)?;
    let suggestions = SqliteSuggestionRepository::try_new(conn)?;

    let mut suggestion = require_open_suggestion(&suggestions, id)?;
    let language = suggestion.language;

    let (word_id, merged) = match words.find_accepted(language, &suggestion.normalized_text)? {
        Some(existing) => {
            for contributor in &suggestion.contributors {
                words.add_accepted_contributor(existing.uuid, *contributor)?;
            }
            words.add_accepted_themes(existing.uuid, &suggestion.themes)?;
            if let Some(dialect) = &suggestion.dialect {
                words.fill_accepted_dialect(existing.uuid, dialect)?;
            }
            (existing.uuid, true)
        }
        None => {
            let valid = ValidWord {
                language,
                text: suggestion.text.clone(),
                normalized_text: suggestion.normalized_text.clone(),
                dialect: suggestion.dialect.clone(),
                themes: suggestion.themes.clone(),
            };
            let new_id = words.insert_accepted(&valid, suggestion.author)?;
            for contributor in &suggestion.contributors {
                words.add_accepted_contributor(new_id, *contributor)?;
            }
            (new_id, false)
        }
    };

    let word = require_accepted(&words, word_id)?;
    let mut linked = Vec::new();
    let mut pending = Vec::new();
    for pre in &suggestion.pre_translations {
        match words.find_accepted(language.opposite(), &pre.normalized_text)? {
            Some(translation) => {
                if pre.proposed_by.is_empty() {
                    words.link_translation(&word, &translation, None)?;
                }
                for proposer in &pre.proposed_by {
                    words.link_translation(&word, &translation, Some(*proposer))?;
                }
                linked.push(translation.uuid);
            }
            None => {
                let target = ValidWord {
                    language: language.opposite(),
                    text: pre.text.clone(),
                    normalized_text: pre.normalized_text.clone(),
                    dialect: None,
                    themes: Vec::new(),
                };
                let mut proposers = pre.proposed_by.iter().copied();
                let upsert = upsert_suggestion(&suggestions, &target, proposers.next())?;
                for proposer in proposers {
                    suggestions.add_suggested_contributor(upsert.id, proposer)?;
                }
                let back = PreTranslation {
                    text: word.text.clone(),
                    normalized_text: word.normalized_text.clone(),
                    proposed_by: pre.proposed_by.clone(),
                };
                suggestions.add_pre_translation(upsert.id, &back)?;
                pending.push(upsert.id);
            }
        }
    }

    suggestions.delete_suggested(id)?;

    if let Some(author) = suggestion.author {
        users.adjust_rating(author, rating.accepted_author)?;
    }
    for contributor in suggestion.co_contributors() {
        users.adjust_rating(contributor, rating.accepted_contributor)?;
    }

    suggestion.status = SuggestionStatus::Accepted;
    Ok(AcceptanceOutcome {
        word: require_accepted(&words, word_id)?,
        merged,
        linked,
        pending,
        suggestion,
    })
}
