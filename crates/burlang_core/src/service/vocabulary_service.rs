//! Vocabulary facade.
//!
//! # Responsibility
//! - Give front ends (bot, CLI) one entry point for every use case.
//! - Emit exactly one `event=<op> module=vocabulary` line per call.
//!
//! # Invariants
//! - The facade holds no state beyond its handlers and never touches
//!   repositories directly.
//! - Log lines never carry user-typed text.

use crate::model::language::Language;
use crate::model::search::{SearchHistoryEntry, SearchedWord};
use crate::model::user::{Permission, TelegramUser, UserId};
use crate::model::word::{AcceptedWord, SuggestedWord, SuggestionStatus, WordDraft, WordId};
use crate::service::acceptance::{AcceptanceHandler, AcceptanceOutcome, VoteOutcome};
use crate::service::error::VocabularyResult;
use crate::service::find_translation::{FindTranslationHandler, FindTranslationResult};
use crate::service::listing::{ListingHandler, Page, PageRequest};
use crate::service::suggest::{SuggestTranslationHandler, SuggestWordOutcome, TranslationOutcome};
use crate::service::users::UserHandler;
use log::{error, info, warn};
use std::time::Instant;

const MODULE: &str = "vocabulary";

/// Facade over the vocabulary handlers. Built by [`crate::composition::compose`].
pub struct VocabularyService<'conn> {
    acceptance: AcceptanceHandler<'conn>,
    suggest: SuggestTranslationHandler<'conn>,
    find: FindTranslationHandler<'conn>,
    listing: ListingHandler<'conn>,
    users: UserHandler<'conn>,
}

impl<'conn> VocabularyService<'conn> {
    pub fn new(
        acceptance: AcceptanceHandler<'conn>,
        suggest: SuggestTranslationHandler<'conn>,
        find: FindTranslationHandler<'conn>,
        listing: ListingHandler<'conn>,
        users: UserHandler<'conn>,
    ) -> Self {
        Self {
            acceptance,
            suggest,
            find,
            listing,
            users,
        }
    }

    pub fn register_user(
        &self,
        id: UserId,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> VocabularyResult<TelegramUser> {
        observe("user_register", || {
            self.users.register(id, username, first_name)
        })
    }

    pub fn user_profile(&self, id: UserId) -> VocabularyResult<TelegramUser> {
        observe("user_profile", || self.users.profile(id))
    }

    pub fn grant_permission(
        &self,
        actor: UserId,
        target: UserId,
        permission: Permission,
    ) -> VocabularyResult<TelegramUser> {
        observe("permission_grant", || {
            self.users.grant_permission(actor, target, permission)
        })
    }

    pub fn revoke_permission(
        &self,
        actor: UserId,
        target: UserId,
        permission: Permission,
    ) -> VocabularyResult<TelegramUser> {
        observe("permission_revoke", || {
            self.users.revoke_permission(actor, target, permission)
        })
    }

    pub fn claim_first_admin(&self, id: UserId) -> VocabularyResult<TelegramUser> {
        observe("admin_claim", || self.users.claim_first_admin(id))
    }

    pub fn leaderboard(&self, limit: u32) -> VocabularyResult<Vec<TelegramUser>> {
        observe("leaderboard", || self.users.leaderboard(limit))
    }

    pub fn suggest_word(
        &self,
        user: UserId,
        draft: &WordDraft,
    ) -> VocabularyResult<SuggestWordOutcome> {
        observe("word_suggest", || self.suggest.suggest_word(user, draft))
    }

    pub fn suggest_translation(
        &self,
        user: UserId,
        source: &WordDraft,
        translation_text: &str,
    ) -> VocabularyResult<TranslationOutcome> {
        observe("translation_suggest", || {
            self.suggest
                .suggest_translation(user, source, translation_text)
        })
    }

    pub fn accept(&self, moderator: UserId, id: WordId) -> VocabularyResult<AcceptanceOutcome> {
        observe("suggestion_accept", || self.acceptance.accept(moderator, id))
    }

    pub fn decline(&self, moderator: UserId, id: WordId) -> VocabularyResult<SuggestedWord> {
        observe("suggestion_decline", || {
            self.acceptance.decline(moderator, id)
        })
    }

    pub fn vote(&self, user: UserId, id: WordId, approve: bool) -> VocabularyResult<VoteOutcome> {
        observe("suggestion_vote", || self.acceptance.vote(user, id, approve))
    }

    pub fn unlink_translation(
        &self,
        moderator: UserId,
        word: WordId,
        translation: WordId,
    ) -> VocabularyResult<AcceptedWord> {
        observe("translation_unlink", || {
            self.acceptance
                .unlink_translation(moderator, word, translation)
        })
    }

    pub fn find_translation(
        &self,
        user: Option<UserId>,
        language: Language,
        text: &str,
    ) -> VocabularyResult<FindTranslationResult> {
        observe("translation_find", || self.find.find(user, language, text))
    }

    pub fn search(
        &self,
        language: Language,
        query: &str,
        limit: u32,
    ) -> VocabularyResult<Vec<AcceptedWord>> {
        observe("word_search", || self.listing.search(language, query, limit))
    }

    pub fn paginate_accepted(
        &self,
        language: Language,
        request: PageRequest,
    ) -> VocabularyResult<Page<AcceptedWord>> {
        observe("accepted_page", || {
            self.listing.paginate_accepted(language, request)
        })
    }

    pub fn paginate_suggested(
        &self,
        language: Language,
        status: Option<SuggestionStatus>,
        request: PageRequest,
    ) -> VocabularyResult<Page<SuggestedWord>> {
        observe("suggested_page", || {
            self.listing.paginate_suggested(language, status, request)
        })
    }

    pub fn search_history(
        &self,
        user: UserId,
        request: PageRequest,
    ) -> VocabularyResult<Page<SearchHistoryEntry>> {
        observe("search_history", || {
            self.listing.search_history(user, request)
        })
    }

    pub fn top_searches(
        &self,
        language: Language,
        limit: u32,
    ) -> VocabularyResult<Vec<SearchedWord>> {
        observe("top_searches", || self.listing.top_searches(language, limit))
    }
}

fn observe<T, F>(event: &'static str, op: F) -> VocabularyResult<T>
where
    F: FnOnce() -> VocabularyResult<T>,
{
    let started_at = Instant::now();
    let result = op();
    let duration_ms = started_at.elapsed().as_millis();

    match &result {
        Ok(_) => info!(
            "event={} module={} status=ok duration_ms={}",
            event, MODULE, duration_ms
        ),
        Err(err) if err.is_internal() => error!(
            "event={} module={} status=error duration_ms={} error_code={} error={}",
            event,
            MODULE,
            duration_ms,
            err.code(),
            err
        ),
        Err(err) => warn!(
            "event={} module={} status=error duration_ms={} error_code={}",
            event,
            MODULE,
            duration_ms,
            err.code()
        ),
    }
    result
}
