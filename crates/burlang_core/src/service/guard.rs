//! Transaction and permission helpers shared by handlers.

use crate::model::user::{Permission, TelegramUser, UserId};
use crate::model::word::{AcceptedWord, SuggestedWord, WordId};
use crate::repo::suggestion_repo::SuggestionRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::word_repo::WordRepository;
use crate::service::error::{VocabularyError, VocabularyResult};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Starts an immediate (write-locking) transaction on a shared connection.
pub(crate) fn begin_immediate(conn: &Connection) -> VocabularyResult<Transaction<'_>> {
    Ok(Transaction::new_unchecked(
        conn,
        TransactionBehavior::Immediate,
    )?)
}

pub(crate) fn require_user<U: UserRepository>(
    users: &U,
    id: UserId,
) -> VocabularyResult<TelegramUser> {
    users.get_user(id)?.ok_or(VocabularyError::UserNotFound(id))
}

pub(crate) fn require_permission(
    user: &TelegramUser,
    permission: Permission,
) -> VocabularyResult<()> {
    if user.has_permission(permission) {
        Ok(())
    } else {
        Err(VocabularyError::PermissionDenied {
            user: user.id,
            required: permission,
        })
    }
}

pub(crate) fn require_accepted<W: WordRepository>(
    words: &W,
    id: WordId,
) -> VocabularyResult<AcceptedWord> {
    words.get_accepted(id)?.ok_or(VocabularyError::WordNotFound(id))
}

/// Loads a suggestion that moderators may still act on.
pub(crate) fn require_open_suggestion<S: SuggestionRepository>(
    suggestions: &S,
    id: WordId,
) -> VocabularyResult<SuggestedWord> {
    let suggestion = suggestions
        .get_suggested(id)?
        .ok_or(VocabularyError::SuggestionNotFound(id))?;
    if !suggestion.status.is_open() {
        return Err(VocabularyError::SuggestionClosed {
            id,
            status: suggestion.status,
        });
    }
    Ok(suggestion)
}

pub(crate) fn require_suggestion<S: SuggestionRepository>(
    suggestions: &S,
    id: WordId,
) -> VocabularyResult<SuggestedWord> {
    suggestions
        .get_suggested(id)?
        .ok_or(VocabularyError::SuggestionNotFound(id))
}
