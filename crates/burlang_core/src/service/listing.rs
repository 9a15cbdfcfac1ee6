//! Read-side queries: prefix search, paginated listings, search history.
//!
//! # Invariants
//! - Pages are 1-based; page `0` reads as page `1`.
//! - `per_page` falls back to [`PagePolicy::default_per_page`] and is
//!   clamped to [`PagePolicy::max_per_page`].

use crate::config::PagePolicy;
use crate::model::language::{normalize_text, Language};
use crate::model::search::{SearchHistoryEntry, SearchedWord};
use crate::model::user::UserId;
use crate::model::word::{AcceptedWord, SuggestedWord, SuggestionStatus};
use crate::repo::search_repo::{SearchRepository, SqliteSearchRepository};
use crate::repo::suggestion_repo::{
    SqliteSuggestionRepository, SuggestionListQuery, SuggestionRepository,
};
use crate::repo::user_repo::SqliteUserRepository;
use crate::repo::word_repo::{SqliteWordRepository, WordRepository};
use crate::service::error::VocabularyResult;
use crate::service::guard::require_user;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Caller-facing page selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: Option<u32>,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page: Some(per_page),
        }
    }

    /// Returns `(page, per_page, offset)` after defaults and clamping.
    pub fn resolve(&self, policy: &PagePolicy) -> (u32, u32, u32) {
        let page = self.page.max(1);
        let per_page = self
            .per_page
            .filter(|value| *value > 0)
            .unwrap_or(policy.default_per_page)
            .min(policy.max_per_page);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, per_page: u32, total: u64) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            total.div_ceil(u64::from(per_page))
        };
        Self {
            items,
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

pub struct ListingHandler<'conn> {
    conn: &'conn Connection,
    page: PagePolicy,
}

impl<'conn> ListingHandler<'conn> {
    pub fn new(conn: &'conn Connection, page: PagePolicy) -> Self {
        Self { conn, page }
    }

    /// Prefix search over accepted words, ordered by normalized text.
    ///
    /// A blank query or `limit == 0` returns an empty list.
    pub fn search(
        &self,
        language: Language,
        query: &str,
        limit: u32,
    ) -> VocabularyResult<Vec<AcceptedWord>> {
        let prefix = normalize_text(language, query);
        if prefix.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }
        let words = SqliteWordRepository::try_new(self.conn)?;
        Ok(words.search_accepted(language, &prefix, limit.min(self.page.max_per_page))?)
    }

    pub fn paginate_accepted(
        &self,
        language: Language,
        request: PageRequest,
    ) -> VocabularyResult<Page<AcceptedWord>> {
        let (page, per_page, offset) = request.resolve(&self.page);
        let words = SqliteWordRepository::try_new(self.conn)?;
        let total = words.count_accepted(language)?;
        let items = words.list_accepted(language, per_page, offset)?;
        Ok(Page::new(items, page, per_page, total))
    }

    /// `status = None` lists suggestions in every status.
    pub fn paginate_suggested(
        &self,
        language: Language,
        status: Option<SuggestionStatus>,
        request: PageRequest,
    ) -> VocabularyResult<Page<SuggestedWord>> {
        let (page, per_page, offset) = request.resolve(&self.page);
        let suggestions = SqliteSuggestionRepository::try_new(self.conn)?;
        let total = suggestions.count_suggested(language, status)?;
        let items = suggestions.list_suggested(&SuggestionListQuery {
            language,
            status,
            limit: per_page,
            offset,
        })?;
        Ok(Page::new(items, page, per_page, total))
    }

    /// The user's lookups, newest first.
    pub fn search_history(
        &self,
        user: UserId,
        request: PageRequest,
    ) -> VocabularyResult<Page<SearchHistoryEntry>> {
        require_user(&SqliteUserRepository::try_new(self.conn)?, user)?;
        let (page, per_page, offset) = request.resolve(&self.page);
        let searches = SqliteSearchRepository::try_new(self.conn)?;
        let total = searches.count_history(user)?;
        let items = searches.list_history(user, per_page, offset)?;
        Ok(Page::new(items, page, per_page, total))
    }

    pub fn top_searches(
        &self,
        language: Language,
        limit: u32,
    ) -> VocabularyResult<Vec<SearchedWord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let searches = SqliteSearchRepository::try_new(self.conn)?;
        Ok(searches.top_searched(language, limit.min(self.page.max_per_page))?)
    }
}
