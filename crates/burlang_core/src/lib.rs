//! Core domain logic for the Burlang Buryat-Russian vocabulary.
//! This crate is the single source of truth for business invariants.

pub mod composition;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use composition::{compose, init_logging_from, open_and_compose, Composition};
pub use config::{CoreConfig, ModerationPolicy, PagePolicy, RatingPolicy};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::language::{normalize_text, Language};
pub use model::search::{FoundTranslation, SearchHistoryEntry, SearchedWord};
pub use model::user::{Permission, TelegramUser, UserId};
pub use model::word::{
    AcceptedWord, PreTranslation, SuggestedWord, SuggestionStatus, TranslationContribution,
    WordDraft, WordId, WordValidationError,
};
pub use repo::word_repo::{RepoError, RepoResult};
pub use service::acceptance::{AcceptanceHandler, AcceptanceOutcome, VoteOutcome};
pub use service::error::{VocabularyError, VocabularyResult};
pub use service::find_translation::{FindTranslationHandler, FindTranslationResult};
pub use service::listing::{ListingHandler, Page, PageRequest};
pub use service::suggest::{SuggestTranslationHandler, SuggestWordOutcome, TranslationOutcome};
pub use service::users::UserHandler;
pub use service::vocabulary_service::VocabularyService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
