//! Suggested-word repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence for the `suggested_words` collection, its
//!   contributors, themes and pre-translations.
//! - Record community moderation votes per suggestion.
//!
//! # Invariants
//! - `(language, normalized_text)` is unique across all statuses, so a
//!   rejected suggestion is reopened instead of duplicated.
//! - Deleting a suggestion cascades to contributors, themes,
//!   pre-translations, their proposers and votes.

use crate::model::language::Language;
use crate::model::user::UserId;
use crate::model::word::{PreTranslation, SuggestedWord, SuggestionStatus, ValidWord, WordId};
use crate::repo::word_repo::{
    ensure_schema_ready, load_strings, load_user_ids, parse_language, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Params, Row};
use uuid::Uuid;

const SUGGESTED_SELECT_SQL: &str = "SELECT
    uuid,
    language,
    text,
    normalized_text,
    author_id,
    dialect,
    status,
    created_at,
    updated_at
FROM suggested_words";

/// Query options for listing suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionListQuery {
    pub language: Language,
    /// `None` lists every status.
    pub status: Option<SuggestionStatus>,
    pub limit: u32,
    pub offset: u32,
}

/// What a vote write changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    /// First vote of this user on this suggestion.
    First,
    /// The user flipped an earlier vote.
    Changed,
    /// Same vote as before.
    Unchanged,
}

/// Current vote counts of one suggestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct VoteTally {
    pub approvals: u32,
    pub rejections: u32,
}

/// Repository interface for the suggested collection.
pub trait SuggestionRepository {
    fn get_suggested(&self, id: WordId) -> RepoResult<Option<SuggestedWord>>;
    fn find_suggested(
        &self,
        language: Language,
        normalized_text: &str,
    ) -> RepoResult<Option<SuggestedWord>>;
    /// Inserts with status `new`; the author becomes its first contributor.
    fn insert_suggested(&self, word: &ValidWord, author: Option<UserId>) -> RepoResult<WordId>;
    /// Returns `true` when the contributor was not present yet.
    fn add_suggested_contributor(&self, id: WordId, user: UserId) -> RepoResult<bool>;
    fn add_suggested_themes(&self, id: WordId, themes: &[String]) -> RepoResult<()>;
    fn fill_suggested_dialect(&self, id: WordId, dialect: &str) -> RepoResult<bool>;
    /// Returns `true` when the text or one of its proposers was not present yet.
    fn add_pre_translation(&self, id: WordId, pre: &PreTranslation) -> RepoResult<bool>;
    fn set_status(&self, id: WordId, status: SuggestionStatus) -> RepoResult<()>;
    fn delete_suggested(&self, id: WordId) -> RepoResult<()>;
    /// Newest first: `created_at DESC, uuid ASC`.
    fn list_suggested(&self, query: &SuggestionListQuery) -> RepoResult<Vec<SuggestedWord>>;
    fn count_suggested(
        &self,
        language: Language,
        status: Option<SuggestionStatus>,
    ) -> RepoResult<u64>;
    fn record_vote(&self, id: WordId, user: UserId, approve: bool) -> RepoResult<VoteChange>;
    fn vote_tally(&self, id: WordId) -> RepoResult<VoteTally>;
    /// Drops every vote; used when a rejected suggestion is reopened.
    fn clear_votes(&self, id: WordId) -> RepoResult<u32>;
}

/// SQLite-backed suggested-word repository.
pub struct SqliteSuggestionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSuggestionRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn collect<P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<SuggestedWord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut words = Vec::new();
        while let Some(row) = rows.next()? {
            let mut word = parse_suggested_row(row)?;
            load_suggested_children(self.conn, &mut word)?;
            words.push(word);
        }
        Ok(words)
    }

    fn touch(&self, id: WordId) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE suggested_words
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        Ok(())
    }
}

impl SuggestionRepository for SqliteSuggestionRepository<'_> {
    fn get_suggested(&self, id: WordId) -> RepoResult<Option<SuggestedWord>> {
        let words = self.collect(
            &format!("{SUGGESTED_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
        )?;
        Ok(words.into_iter().next())
    }

    fn find_suggested(
        &self,
        language: Language,
        normalized_text: &str,
    ) -> RepoResult<Option<SuggestedWord>> {
        let words = self.collect(
            &format!("{SUGGESTED_SELECT_SQL} WHERE language = ?1 AND normalized_text = ?2;"),
            params![language.as_db(), normalized_text],
        )?;
        Ok(words.into_iter().next())
    }

    fn insert_suggested(&self, word: &ValidWord, author: Option<UserId>) -> RepoResult<WordId> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO suggested_words (
                uuid,
                language,
                text,
                normalized_text,
                author_id,
                dialect,
                status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'new');",
            params![
                id.to_string(),
                word.language.as_db(),
                word.text,
                word.normalized_text,
                author,
                word.dialect,
            ],
        )?;

        if let Some(author) = author {
            self.add_suggested_contributor(id, author)?;
        }
        self.add_suggested_themes(id, &word.themes)?;
        Ok(id)
    }

    fn add_suggested_contributor(&self, id: WordId, user: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO suggested_word_contributors (word_uuid, user_id)
             VALUES (?1, ?2);",
            params![id.to_string(), user],
        )?;
        if changed > 0 {
            self.touch(id)?;
        }
        Ok(changed > 0)
    }

    fn add_suggested_themes(&self, id: WordId, themes: &[String]) -> RepoResult<()> {
        let id_text = id.to_string();
        let mut inserted = 0;
        for theme in themes {
            inserted += self.conn.execute(
                "INSERT OR IGNORE INTO suggested_word_themes (word_uuid, theme)
                 VALUES (?1, ?2);",
                params![id_text, theme],
            )?;
        }
        if inserted > 0 {
            self.touch(id)?;
        }
        Ok(())
    }

    fn fill_suggested_dialect(&self, id: WordId, dialect: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE suggested_words
             SET dialect = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND dialect IS NULL;",
            params![id.to_string(), dialect],
        )?;
        Ok(changed > 0)
    }

    fn add_pre_translation(&self, id: WordId, pre: &PreTranslation) -> RepoResult<bool> {
        let id_text = id.to_string();
        let mut changed = self.conn.execute(
            "INSERT OR IGNORE INTO suggested_pre_translations (
                word_uuid,
                normalized_text,
                text
            ) VALUES (?1, ?2, ?3);",
            params![id_text, pre.normalized_text, pre.text],
        )?;
        for user in &pre.proposed_by {
            changed += self.conn.execute(
                "INSERT OR IGNORE INTO suggested_pre_translation_proposers (
                    word_uuid,
                    normalized_text,
                    user_id
                ) VALUES (?1, ?2, ?3);",
                params![id_text, pre.normalized_text, user],
            )?;
        }
        if changed > 0 {
            self.touch(id)?;
        }
        Ok(changed > 0)
    }

    fn set_status(&self, id: WordId, status: SuggestionStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE suggested_words
             SET status = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), status.as_db()],
        )?;
        if changed == 0 {
            return Err(RepoError::SuggestionNotFound(id));
        }
        Ok(())
    }

    fn delete_suggested(&self, id: WordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM suggested_words WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::SuggestionNotFound(id));
        }
        Ok(())
    }

    fn list_suggested(&self, query: &SuggestionListQuery) -> RepoResult<Vec<SuggestedWord>> {
        let mut sql = format!("{SUGGESTED_SELECT_SQL} WHERE language = ?");
        let mut bind_values = vec![Value::Text(query.language.as_db().to_string())];

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_db().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, uuid ASC LIMIT ? OFFSET ?");
        bind_values.push(Value::Integer(i64::from(query.limit)));
        bind_values.push(Value::Integer(i64::from(query.offset)));

        self.collect(&sql, params_from_iter(bind_values))
    }

    fn count_suggested(
        &self,
        language: Language,
        status: Option<SuggestionStatus>,
    ) -> RepoResult<u64> {
        let count: i64 = match status {
            Some(status) => self.conn.query_row(
                "SELECT COUNT(*) FROM suggested_words WHERE language = ?1 AND status = ?2;",
                params![language.as_db(), status.as_db()],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "SELECT COUNT(*) FROM suggested_words WHERE language = ?1;",
                [language.as_db()],
                |row| row.get(0),
            )?,
        };
        Ok(count.max(0) as u64)
    }

    fn record_vote(&self, id: WordId, user: UserId, approve: bool) -> RepoResult<VoteChange> {
        let id_text = id.to_string();
        let previous: Option<bool> = self
            .conn
            .query_row(
                "SELECT approve
                 FROM suggestion_votes
                 WHERE word_uuid = ?1
                   AND user_id = ?2;",
                params![id_text, user],
                |row| row.get(0),
            )
            .optional()?;

        match previous {
            None => {
                self.conn.execute(
                    "INSERT INTO suggestion_votes (word_uuid, user_id, approve)
                     VALUES (?1, ?2, ?3);",
                    params![id_text, user, approve],
                )?;
                self.touch(id)?;
                Ok(VoteChange::First)
            }
            Some(previous) if previous == approve => Ok(VoteChange::Unchanged),
            Some(_) => {
                self.conn.execute(
                    "UPDATE suggestion_votes
                     SET approve = ?3,
                         updated_at = (strftime('%s', 'now') * 1000)
                     WHERE word_uuid = ?1
                       AND user_id = ?2;",
                    params![id_text, user, approve],
                )?;
                self.touch(id)?;
                Ok(VoteChange::Changed)
            }
        }
    }

    fn vote_tally(&self, id: WordId) -> RepoResult<VoteTally> {
        let (approvals, rejections): (i64, i64) = self.conn.query_row(
            "SELECT
                COALESCE(SUM(approve), 0),
                COALESCE(SUM(1 - approve), 0)
             FROM suggestion_votes
             WHERE word_uuid = ?1;",
            [id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(VoteTally {
            approvals: approvals.max(0) as u32,
            rejections: rejections.max(0) as u32,
        })
    }

    fn clear_votes(&self, id: WordId) -> RepoResult<u32> {
        let removed = self.conn.execute(
            "DELETE FROM suggestion_votes WHERE word_uuid = ?1;",
            [id.to_string()],
        )?;
        Ok(removed as u32)
    }
}

fn parse_suggested_row(row: &Row<'_>) -> RepoResult<SuggestedWord> {
    let uuid_text: String = row.get("uuid")?;
    let language_text: String = row.get("language")?;
    let status_text: String = row.get("status")?;
    let status = SuggestionStatus::from_db(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{status_text}` in suggested_words.status"
        ))
    })?;

    Ok(SuggestedWord {
        uuid: parse_uuid(&uuid_text, "suggested_words.uuid")?,
        language: parse_language(&language_text, "suggested_words.language")?,
        text: row.get("text")?,
        normalized_text: row.get("normalized_text")?,
        author: row.get("author_id")?,
        contributors: Vec::new(),
        themes: Vec::new(),
        dialect: row.get("dialect")?,
        status,
        pre_translations: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_suggested_children(conn: &Connection, word: &mut SuggestedWord) -> RepoResult<()> {
    let id = word.uuid.to_string();
    word.contributors = load_user_ids(
        conn,
        "SELECT user_id
         FROM suggested_word_contributors
         WHERE word_uuid = ?1
         ORDER BY user_id ASC;",
        [id.as_str()],
    )?;
    word.themes = load_strings(
        conn,
        "SELECT theme
         FROM suggested_word_themes
         WHERE word_uuid = ?1
         ORDER BY theme ASC;",
        [id.as_str()],
    )?;

    let mut stmt = conn.prepare(
        "SELECT text, normalized_text
         FROM suggested_pre_translations
         WHERE word_uuid = ?1
         ORDER BY normalized_text ASC;",
    )?;
    let mut rows = stmt.query([id.as_str()])?;
    while let Some(row) = rows.next()? {
        let normalized_text: String = row.get("normalized_text")?;
        let proposed_by = load_user_ids(
            conn,
            "SELECT user_id
             FROM suggested_pre_translation_proposers
             WHERE word_uuid = ?1
               AND normalized_text = ?2
             ORDER BY user_id ASC;",
            params![id, normalized_text],
        )?;
        word.pre_translations.push(PreTranslation {
            text: row.get("text")?,
            normalized_text,
            proposed_by,
        });
    }
    Ok(())
}
