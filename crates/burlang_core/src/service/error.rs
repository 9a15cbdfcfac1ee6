//! Use-case error shared by every vocabulary handler.

use crate::model::language::Language;
use crate::model::user::{Permission, UserId};
use crate::model::word::{SuggestionStatus, WordId, WordValidationError};
use crate::repo::word_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type VocabularyResult<T> = Result<T, VocabularyError>;

#[derive(Debug)]
pub enum VocabularyError {
    /// User input failed word validation.
    Validation(WordValidationError),
    UserNotFound(UserId),
    PermissionDenied {
        user: UserId,
        required: Permission,
    },
    SuggestionNotFound(WordId),
    /// Suggestion is no longer `new`/`processing`.
    SuggestionClosed {
        id: WordId,
        status: SuggestionStatus,
    },
    /// Authors cannot vote on their own suggestion.
    SelfVote {
        user: UserId,
        suggestion: WordId,
    },
    WordNotFound(WordId),
    LinkNotFound {
        word: WordId,
        translation: WordId,
    },
    /// Both words of a link belong to one language.
    SameLanguage(Language),
    Repo(RepoError),
}

impl VocabularyError {
    /// Stable code used in `error_code=` log fields and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::UserNotFound(_) => "user_not_found",
            Self::PermissionDenied { .. } => "permission_denied",
            Self::SuggestionNotFound(_) => "suggestion_not_found",
            Self::SuggestionClosed { .. } => "suggestion_closed",
            Self::SelfVote { .. } => "self_vote",
            Self::WordNotFound(_) => "word_not_found",
            Self::LinkNotFound { .. } => "link_not_found",
            Self::SameLanguage(_) => "same_language",
            Self::Repo(_) => "storage_failed",
        }
    }

    /// Whether the failure comes from storage rather than from the caller.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Repo(_))
    }
}

impl Display for VocabularyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::PermissionDenied { user, required } => write!(
                f,
                "user {user} lacks `{}` permission",
                required.as_db()
            ),
            Self::SuggestionNotFound(id) => write!(f, "suggestion not found: {id}"),
            Self::SuggestionClosed { id, status } => write!(
                f,
                "suggestion {id} is already {}",
                status.as_db()
            ),
            Self::SelfVote { user, suggestion } => {
                write!(f, "user {user} authored suggestion {suggestion} and cannot vote on it")
            }
            Self::WordNotFound(id) => write!(f, "accepted word not found: {id}"),
            Self::LinkNotFound { word, translation } => {
                write!(f, "no translation link between {word} and {translation}")
            }
            Self::SameLanguage(language) => {
                write!(f, "both words are {language}; links join russian and buryat")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VocabularyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for VocabularyError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::WordNotFound(id) => Self::WordNotFound(id),
            RepoError::SuggestionNotFound(id) => Self::SuggestionNotFound(id),
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::SameLanguageLink { language } => Self::SameLanguage(language),
            other => Self::Repo(other),
        }
    }
}

impl From<WordValidationError> for VocabularyError {
    fn from(value: WordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<rusqlite::Error> for VocabularyError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}
