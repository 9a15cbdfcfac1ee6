//! Search audit trail repository.
//!
//! # Responsibility
//! - Count distinct normalized queries per language (`searched_words`).
//! - Append one history row per lookup (`searched_word_history`).
//!
//! # Invariants
//! - `found_language` and `found_uuid` are either both set or both null.
//! - History is listed newest first by insertion id.

use crate::model::language::Language;
use crate::model::search::{FoundTranslation, SearchHistoryEntry, SearchedWord};
use crate::model::user::UserId;
use crate::repo::word_repo::{ensure_schema_ready, parse_language, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Params, Row};
use uuid::Uuid;

const HISTORY_SELECT_SQL: &str = "SELECT
    h.id AS id,
    h.searched_uuid AS searched_uuid,
    s.language AS language,
    s.text AS text,
    h.user_id AS user_id,
    h.found_language AS found_language,
    h.found_uuid AS found_uuid,
    h.created_at AS created_at
FROM searched_word_history h
INNER JOIN searched_words s ON s.uuid = h.searched_uuid";

const SEARCHED_SELECT_SQL: &str = "SELECT
    uuid,
    language,
    text,
    normalized_text,
    search_count
FROM searched_words";

/// One lookup to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRecord<'a> {
    pub language: Language,
    pub text: &'a str,
    pub normalized_text: &'a str,
    pub user: Option<UserId>,
    pub found: Option<FoundTranslation>,
}

pub trait SearchRepository {
    /// Upserts the searched word, bumps its counter and appends history.
    fn record_search(&self, record: &SearchRecord<'_>) -> RepoResult<SearchHistoryEntry>;
    fn find_searched(
        &self,
        language: Language,
        normalized_text: &str,
    ) -> RepoResult<Option<SearchedWord>>;
    fn list_history(&self, user: UserId, limit: u32, offset: u32)
        -> RepoResult<Vec<SearchHistoryEntry>>;
    fn count_history(&self, user: UserId) -> RepoResult<u64>;
    /// Ordered by `search_count DESC, normalized_text ASC`.
    fn top_searched(&self, language: Language, limit: u32) -> RepoResult<Vec<SearchedWord>>;
}

pub struct SqliteSearchRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSearchRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn collect_history<P: Params>(
        &self,
        sql: &str,
        params: P,
    ) -> RepoResult<Vec<SearchHistoryEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_history_row(row)?);
        }
        Ok(entries)
    }

    fn collect_searched<P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<SearchedWord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut words = Vec::new();
        while let Some(row) = rows.next()? {
            words.push(parse_searched_row(row)?);
        }
        Ok(words)
    }
}

impl SearchRepository for SqliteSearchRepository<'_> {
    fn record_search(&self, record: &SearchRecord<'_>) -> RepoResult<SearchHistoryEntry> {
        self.conn.execute(
            "INSERT INTO searched_words (uuid, language, text, normalized_text, search_count)
             VALUES (?1, ?2, ?3, ?4, 1)
             ON CONFLICT(language, normalized_text) DO UPDATE SET
                search_count = search_count + 1,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![
                Uuid::new_v4().to_string(),
                record.language.as_db(),
                record.text,
                record.normalized_text,
            ],
        )?;

        let searched = self
            .find_searched(record.language, record.normalized_text)?
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "searched word `{}` missing after upsert",
                    record.normalized_text
                ))
            })?;

        self.conn.execute(
            "INSERT INTO searched_word_history (
                searched_uuid,
                user_id,
                found_language,
                found_uuid
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                searched.uuid.to_string(),
                record.user,
                record.found.map(|found| found.language.as_db()),
                record.found.map(|found| found.word.to_string()),
            ],
        )?;
        let history_id = self.conn.last_insert_rowid();

        self.collect_history(&format!("{HISTORY_SELECT_SQL} WHERE h.id = ?1;"), [history_id])?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RepoError::InvalidData(format!("search history row {history_id} missing"))
            })
    }

    fn find_searched(
        &self,
        language: Language,
        normalized_text: &str,
    ) -> RepoResult<Option<SearchedWord>> {
        let words = self.collect_searched(
            &format!("{SEARCHED_SELECT_SQL} WHERE language = ?1 AND normalized_text = ?2;"),
            params![language.as_db(), normalized_text],
        )?;
        Ok(words.into_iter().next())
    }

    fn list_history(
        &self,
        user: UserId,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<SearchHistoryEntry>> {
        self.collect_history(
            &format!("{HISTORY_SELECT_SQL} WHERE h.user_id = ?1 ORDER BY h.id DESC LIMIT ?2 OFFSET ?3;"),
            params![user, i64::from(limit), i64::from(offset)],
        )
    }

    fn count_history(&self, user: UserId) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM searched_word_history WHERE user_id = ?1;",
            [user],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn top_searched(&self, language: Language, limit: u32) -> RepoResult<Vec<SearchedWord>> {
        self.collect_searched(
            &format!(
                "{SEARCHED_SELECT_SQL}
                 WHERE language = ?1
                 ORDER BY search_count DESC, normalized_text ASC
                 LIMIT ?2;"
            ),
            params![language.as_db(), i64::from(limit)],
        )
    }
}

fn parse_searched_row(row: &Row<'_>) -> RepoResult<SearchedWord> {
    let uuid_text: String = row.get("uuid")?;
    let language_text: String = row.get("language")?;
    Ok(SearchedWord {
        uuid: parse_uuid(&uuid_text, "searched_words.uuid")?,
        language: parse_language(&language_text, "searched_words.language")?,
        text: row.get("text")?,
        normalized_text: row.get("normalized_text")?,
        search_count: row.get("search_count")?,
    })
}

fn parse_history_row(row: &Row<'_>) -> RepoResult<SearchHistoryEntry> {
    let searched_text: String = row.get("searched_uuid")?;
    let language_text: String = row.get("language")?;
    let found_language: Option<String> = row.get("found_language")?;
    let found_uuid: Option<String> = row.get("found_uuid")?;

    let found = match (found_language, found_uuid) {
        (Some(language), Some(uuid)) => Some(FoundTranslation {
            language: parse_language(&language, "searched_word_history.found_language")?,
            word: parse_uuid(&uuid, "searched_word_history.found_uuid")?,
        }),
        (None, None) => None,
        _ => {
            return Err(RepoError::InvalidData(
                "half-set found reference in searched_word_history".to_string(),
            ))
        }
    };

    Ok(SearchHistoryEntry {
        id: row.get("id")?,
        searched: parse_uuid(&searched_text, "searched_word_history.searched_uuid")?,
        language: parse_language(&language_text, "searched_words.language")?,
        text: row.get("text")?,
        user: row.get("user_id")?,
        found,
        created_at: row.get("created_at")?,
    })
}
