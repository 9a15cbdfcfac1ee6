//! Word records for the accepted and suggested collections.
//!
//! # Responsibility
//! - Define `AcceptedWord`/`SuggestedWord` read models and the `WordDraft`
//!   input shape used by suggestion flows.
//! - Validate user-provided word text, dialect and themes.
//!
//! # Invariants
//! - `contributors` is a deduplicated union and always contains the author
//!   when one is known.
//! - `translations` point to accepted words of `language.opposite()`.

use crate::model::language::{normalize_text, Language};
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a word in any collection.
pub type WordId = Uuid;

/// Upper bound for word/phrase length, counted in chars.
pub const MAX_WORD_CHARS: usize = 120;

/// Moderation lifecycle of a suggested word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    /// Waiting for the first moderation vote.
    New,
    /// At least one vote has been cast.
    Processing,
    /// Merged into the accepted collection; only seen on consumed snapshots.
    Accepted,
    /// Declined by a moderator or by votes.
    Rejected,
}

impl SuggestionStatus {
    /// Whether moderators may still accept or decline the suggestion.
    pub fn is_open(self) -> bool {
        matches!(self, Self::New | Self::Processing)
    }

    pub fn as_db(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Processing => "processing",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "processing" => Some(Self::Processing),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Validation failures for user-provided word input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordValidationError {
    /// Text is empty once normalized.
    EmptyText,
    /// Text exceeds [`MAX_WORD_CHARS`].
    TextTooLong { max_chars: usize, actual_chars: usize },
    /// Dialect was provided but is blank.
    BlankDialect,
    /// A theme is blank.
    BlankTheme,
}

impl Display for WordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "word text must not be empty"),
            Self::TextTooLong {
                max_chars,
                actual_chars,
            } => write!(
                f,
                "word text has {actual_chars} chars, at most {max_chars} allowed"
            ),
            Self::BlankDialect => write!(f, "dialect must not be blank"),
            Self::BlankTheme => write!(f, "theme must not be blank"),
        }
    }
}

impl Error for WordValidationError {}

/// Validates free text and returns `(trimmed_text, normalized_text)`.
pub fn validate_word_text(
    language: Language,
    text: &str,
) -> Result<(String, String), WordValidationError> {
    let trimmed = text.trim();
    let normalized = normalize_text(language, trimmed);
    if normalized.is_empty() {
        return Err(WordValidationError::EmptyText);
    }
    let actual_chars = trimmed.chars().count();
    if actual_chars > MAX_WORD_CHARS {
        return Err(WordValidationError::TextTooLong {
            max_chars: MAX_WORD_CHARS,
            actual_chars,
        });
    }
    Ok((trimmed.to_string(), normalized))
}

/// User input for a word suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordDraft {
    pub language: Language,
    pub text: String,
    pub dialect: Option<String>,
    pub themes: Vec<String>,
}

/// Draft after validation, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidWord {
    pub language: Language,
    pub text: String,
    pub normalized_text: String,
    pub dialect: Option<String>,
    /// Lowercased, deduplicated and sorted.
    pub themes: Vec<String>,
}

impl WordDraft {
    pub fn new(language: Language, text: impl Into<String>) -> Self {
        Self {
            language,
            text: text.into(),
            dialect: None,
            themes: Vec::new(),
        }
    }

    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = Some(dialect.into());
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.themes.push(theme.into());
        self
    }

    /// Checks the draft and normalizes its text, dialect and themes.
    pub fn validate(&self) -> Result<ValidWord, WordValidationError> {
        let (text, normalized_text) = validate_word_text(self.language, &self.text)?;

        let dialect = match self.dialect.as_deref() {
            Some(value) if value.trim().is_empty() => {
                return Err(WordValidationError::BlankDialect)
            }
            Some(value) => Some(value.trim().to_string()),
            None => None,
        };

        let mut themes = BTreeSet::new();
        for theme in &self.themes {
            let trimmed = theme.trim();
            if trimmed.is_empty() {
                return Err(WordValidationError::BlankTheme);
            }
            themes.insert(trimmed.to_lowercase());
        }

        Ok(ValidWord {
            language: self.language,
            text,
            normalized_text,
            dialect,
            themes: themes.into_iter().collect(),
        })
    }
}

/// Users who proposed one translation link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationContribution {
    pub translation: WordId,
    pub contributors: Vec<UserId>,
}

/// Word confirmed by moderation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptedWord {
    pub uuid: WordId,
    pub language: Language,
    pub text: String,
    pub normalized_text: String,
    pub author: Option<UserId>,
    pub contributors: Vec<UserId>,
    pub translations: Vec<WordId>,
    pub translations_u: Vec<TranslationContribution>,
    pub themes: Vec<String>,
    pub dialect: Option<String>,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
}

/// Translation text proposed for a word that is not accepted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreTranslation {
    pub text: String,
    pub normalized_text: String,
    /// Users who proposed this text, sorted and deduplicated.
    pub proposed_by: Vec<UserId>,
}

impl PreTranslation {
    pub fn new(
        text: impl Into<String>,
        normalized_text: impl Into<String>,
        proposer: Option<UserId>,
    ) -> Self {
        Self {
            text: text.into(),
            normalized_text: normalized_text.into(),
            proposed_by: proposer.into_iter().collect(),
        }
    }
}

/// Word waiting for moderation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedWord {
    pub uuid: WordId,
    pub language: Language,
    pub text: String,
    pub normalized_text: String,
    pub author: Option<UserId>,
    pub contributors: Vec<UserId>,
    pub themes: Vec<String>,
    pub dialect: Option<String>,
    pub status: SuggestionStatus,
    pub pre_translations: Vec<PreTranslation>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl SuggestedWord {
    /// Contributors other than the author.
    pub fn co_contributors(&self) -> impl Iterator<Item = UserId> + '_ {
        self.contributors
            .iter()
            .copied()
            .filter(move |id| Some(*id) != self.author)
    }
}

#[cfg(test)]
mod tests {
    use super::{SuggestionStatus, WordDraft, WordValidationError, MAX_WORD_CHARS};
    use crate::model::language::Language;

    #[test]
    fn validate_normalizes_themes_and_dialect() {
        let draft = WordDraft::new(Language::Buryat, "  Морин ")
            .with_dialect(" хори ")
            .with_theme("Animals")
            .with_theme(" animals")
            .with_theme("Nature");
        let valid = draft.validate().unwrap();
        assert_eq!(valid.text, "Морин");
        assert_eq!(valid.normalized_text, "морин");
        assert_eq!(valid.dialect.as_deref(), Some("хори"));
        assert_eq!(valid.themes, vec!["animals".to_string(), "nature".to_string()]);
    }

    #[test]
    fn validate_rejects_punctuation_only_text() {
        let err = WordDraft::new(Language::Russian, " ?! ").validate().unwrap_err();
        assert_eq!(err, WordValidationError::EmptyText);
    }

    #[test]
    fn validate_rejects_overlong_text_and_blank_theme() {
        let long = "а".repeat(MAX_WORD_CHARS + 1);
        let err = WordDraft::new(Language::Russian, long).validate().unwrap_err();
        assert!(matches!(err, WordValidationError::TextTooLong { .. }));

        let err = WordDraft::new(Language::Russian, "дом")
            .with_theme("  ")
            .validate()
            .unwrap_err();
        assert_eq!(err, WordValidationError::BlankTheme);
    }

    #[test]
    fn only_new_and_processing_are_open() {
        assert!(SuggestionStatus::New.is_open());
        assert!(SuggestionStatus::Processing.is_open());
        assert!(!SuggestionStatus::Accepted.is_open());
        assert!(!SuggestionStatus::Rejected.is_open());
    }
}
