//! Accepted-word repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide lookup/insert/merge APIs over the `accepted_words` collection
//!   and its child tables (contributors, themes).
//! - Own translation links between Russian and Buryat accepted words.
//!
//! # Invariants
//! - `(language, normalized_text)` is unique; inserts of a duplicate key fail.
//! - A translation link is stored once as `(russian_uuid, buryat_uuid)` and is
//!   visible from both sides.
//! - Contributor and theme writes are set unions (`INSERT OR IGNORE`).

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::language::Language;
use crate::model::user::UserId;
use crate::model::word::{
    AcceptedWord, TranslationContribution, ValidWord, WordId, WordValidationError,
};
use rusqlite::{params, Connection, Params, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const ACCEPTED_SELECT_SQL: &str = "SELECT
    uuid,
    language,
    text,
    normalized_text,
    author_id,
    dialect,
    created_at,
    updated_at
FROM accepted_words";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every vocabulary collection.
#[derive(Debug)]
pub enum RepoError {
    Validation(WordValidationError),
    Db(DbError),
    WordNotFound(WordId),
    SuggestionNotFound(WordId),
    UserNotFound(UserId),
    /// Both sides of a translation link are in the same language.
    SameLanguageLink { language: Language },
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::WordNotFound(id) => write!(f, "word not found: {id}"),
            Self::SuggestionNotFound(id) => write!(f, "suggestion not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::SameLanguageLink { language } => {
                write!(f, "cannot link two {language} words as translations")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "vocabulary repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted vocabulary data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<WordValidationError> for RepoError {
    fn from(value: WordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// What a link write changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    /// The link did not exist before.
    Created,
    /// The link existed; the contributor is new on it.
    ContributorAdded,
    Unchanged,
}

impl LinkChange {
    pub fn is_change(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Repository interface for the accepted collection.
pub trait WordRepository {
    fn get_accepted(&self, id: WordId) -> RepoResult<Option<AcceptedWord>>;
    fn find_accepted(
        &self,
        language: Language,
        normalized_text: &str,
    ) -> RepoResult<Option<AcceptedWord>>;
    /// Inserts a new accepted word; the author becomes its first contributor.
    fn insert_accepted(&self, word: &ValidWord, author: Option<UserId>) -> RepoResult<WordId>;
    /// Returns `true` when the contributor was not present yet.
    fn add_accepted_contributor(&self, id: WordId, user: UserId) -> RepoResult<bool>;
    fn add_accepted_themes(&self, id: WordId, themes: &[String]) -> RepoResult<()>;
    /// Sets the dialect only when none is stored. Returns `true` if written.
    fn fill_accepted_dialect(&self, id: WordId, dialect: &str) -> RepoResult<bool>;
    fn link_translation(
        &self,
        word: &AcceptedWord,
        translation: &AcceptedWord,
        contributor: Option<UserId>,
    ) -> RepoResult<LinkChange>;
    /// Returns `true` when a link was removed.
    fn unlink_translation(&self, word: &AcceptedWord, translation: &AcceptedWord)
        -> RepoResult<bool>;
    fn list_translations(&self, word: &AcceptedWord) -> RepoResult<Vec<AcceptedWord>>;
    /// Prefix match on `normalized_text`, ordered by it.
    fn search_accepted(
        &self,
        language: Language,
        normalized_prefix: &str,
        limit: u32,
    ) -> RepoResult<Vec<AcceptedWord>>;
    /// Newest first: `created_at DESC, uuid ASC`.
    fn list_accepted(&self, language: Language, limit: u32, offset: u32)
        -> RepoResult<Vec<AcceptedWord>>;
    fn count_accepted(&self, language: Language) -> RepoResult<u64>;
}

/// SQLite-backed accepted-word repository.
///
/// Works the same on a plain connection or inside a `Transaction`.
pub struct SqliteWordRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteWordRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn collect<P: Params>(&self, sql: &str, params: P) -> RepoResult<Vec<AcceptedWord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut words = Vec::new();
        while let Some(row) = rows.next()? {
            let mut word = parse_accepted_row(row)?;
            load_accepted_children(self.conn, &mut word)?;
            words.push(word);
        }
        Ok(words)
    }

    fn touch(&self, id: WordId) -> RepoResult<()> {
        self.conn.execute(
            "UPDATE accepted_words
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;
        Ok(())
    }
}

impl WordRepository for SqliteWordRepository<'_> {
    fn get_accepted(&self, id: WordId) -> RepoResult<Option<AcceptedWord>> {
        let words = self.collect(
            &format!("{ACCEPTED_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
        )?;
        Ok(words.into_iter().next())
    }

    fn find_accepted(
        &self,
        language: Language,
        normalized_text: &str,
    ) -> RepoResult<Option<AcceptedWord>> {
        let words = self.collect(
            &format!("{ACCEPTED_SELECT_SQL} WHERE language = ?1 AND normalized_text = ?2;"),
            params![language.as_db(), normalized_text],
        )?;
        Ok(words.into_iter().next())
    }

    fn insert_accepted(&self, word: &ValidWord, author: Option<UserId>) -> RepoResult<WordId> {
        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO accepted_words (
                uuid,
                language,
                text,
                normalized_text,
                author_id,
                dialect
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
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
            self.add_accepted_contributor(id, author)?;
        }
        self.add_accepted_themes(id, &word.themes)?;
        Ok(id)
    }

    fn add_accepted_contributor(&self, id: WordId, user: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO accepted_word_contributors (word_uuid, user_id)
             VALUES (?1, ?2);",
            params![id.to_string(), user],
        )?;
        if changed > 0 {
            self.touch(id)?;
        }
        Ok(changed > 0)
    }

    fn add_accepted_themes(&self, id: WordId, themes: &[String]) -> RepoResult<()> {
        let id_text = id.to_string();
        let mut inserted = 0;
        for theme in themes {
            inserted += self.conn.execute(
                "INSERT OR IGNORE INTO accepted_word_themes (word_uuid, theme)
                 VALUES (?1, ?2);",
                params![id_text, theme],
            )?;
        }
        if inserted > 0 {
            self.touch(id)?;
        }
        Ok(())
    }

    fn fill_accepted_dialect(&self, id: WordId, dialect: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "UPDATE accepted_words
             SET dialect = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1
               AND dialect IS NULL;",
            params![id.to_string(), dialect],
        )?;
        Ok(changed > 0)
    }

    fn link_translation(
        &self,
        word: &AcceptedWord,
        translation: &AcceptedWord,
        contributor: Option<UserId>,
    ) -> RepoResult<LinkChange> {
        let (russian, buryat) = link_key(word, translation)?;
        let created = self.conn.execute(
            "INSERT OR IGNORE INTO word_translations (russian_uuid, buryat_uuid)
             VALUES (?1, ?2);",
            params![russian, buryat],
        )? > 0;

        let contributed = match contributor {
            Some(user) => {
                self.conn.execute(
                    "INSERT OR IGNORE INTO word_translation_contributors (
                        russian_uuid,
                        buryat_uuid,
                        user_id
                    ) VALUES (?1, ?2, ?3);",
                    params![russian, buryat, user],
                )? > 0
            }
            None => false,
        };

        if created || contributed {
            self.touch(word.uuid)?;
            self.touch(translation.uuid)?;
        }

        Ok(match (created, contributed) {
            (true, _) => LinkChange::Created,
            (false, true) => LinkChange::ContributorAdded,
            (false, false) => LinkChange::Unchanged,
        })
    }

    fn unlink_translation(
        &self,
        word: &AcceptedWord,
        translation: &AcceptedWord,
    ) -> RepoResult<bool> {
        let (russian, buryat) = link_key(word, translation)?;
        let removed = self.conn.execute(
            "DELETE FROM word_translations
             WHERE russian_uuid = ?1
               AND buryat_uuid = ?2;",
            params![russian, buryat],
        )?;
        if removed > 0 {
            self.touch(word.uuid)?;
            self.touch(translation.uuid)?;
        }
        Ok(removed > 0)
    }

    fn list_translations(&self, word: &AcceptedWord) -> RepoResult<Vec<AcceptedWord>> {
        let mut translations = Vec::with_capacity(word.translations.len());
        for id in &word.translations {
            let translation = self.get_accepted(*id)?.ok_or_else(|| {
                RepoError::InvalidData(format!("translation {id} of {} is missing", word.uuid))
            })?;
            translations.push(translation);
        }
        Ok(translations)
    }

    fn search_accepted(
        &self,
        language: Language,
        normalized_prefix: &str,
        limit: u32,
    ) -> RepoResult<Vec<AcceptedWord>> {
        self.collect(
            &format!(
                "{ACCEPTED_SELECT_SQL}
                 WHERE language = ?1
                   AND normalized_text LIKE ?2 ESCAPE '\\'
                 ORDER BY normalized_text ASC, uuid ASC
                 LIMIT ?3;"
            ),
            params![
                language.as_db(),
                format!("{}%", escape_like(normalized_prefix)),
                i64::from(limit),
            ],
        )
    }

    fn list_accepted(
        &self,
        language: Language,
        limit: u32,
        offset: u32,
    ) -> RepoResult<Vec<AcceptedWord>> {
        self.collect(
            &format!(
                "{ACCEPTED_SELECT_SQL}
                 WHERE language = ?1
                 ORDER BY created_at DESC, uuid ASC
                 LIMIT ?2 OFFSET ?3;"
            ),
            params![language.as_db(), i64::from(limit), i64::from(offset)],
        )
    }

    fn count_accepted(&self, language: Language) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM accepted_words WHERE language = ?1;",
            [language.as_db()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

/// Fails unless the connection carries the latest schema.
pub(crate) fn ensure_schema_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version = current_user_version(conn)?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<WordId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

pub(crate) fn parse_language(value: &str, column: &str) -> RepoResult<Language> {
    Language::from_db(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid language `{value}` in {column}")))
}

pub(crate) fn load_user_ids<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepoResult<Vec<UserId>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

pub(crate) fn load_strings<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        values.push(row.get(0)?);
    }
    Ok(values)
}

/// Escapes `LIKE` wildcards for use with `ESCAPE '\'`.
pub(crate) fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn link_key(word: &AcceptedWord, translation: &AcceptedWord) -> RepoResult<(String, String)> {
    match (word.language, translation.language) {
        (Language::Russian, Language::Buryat) => {
            Ok((word.uuid.to_string(), translation.uuid.to_string()))
        }
        (Language::Buryat, Language::Russian) => {
            Ok((translation.uuid.to_string(), word.uuid.to_string()))
        }
        (language, _) => Err(RepoError::SameLanguageLink { language }),
    }
}

fn parse_accepted_row(row: &Row<'_>) -> RepoResult<AcceptedWord> {
    let uuid_text: String = row.get("uuid")?;
    let language_text: String = row.get("language")?;
    Ok(AcceptedWord {
        uuid: parse_uuid(&uuid_text, "accepted_words.uuid")?,
        language: parse_language(&language_text, "accepted_words.language")?,
        text: row.get("text")?,
        normalized_text: row.get("normalized_text")?,
        author: row.get("author_id")?,
        contributors: Vec::new(),
        translations: Vec::new(),
        translations_u: Vec::new(),
        themes: Vec::new(),
        dialect: row.get("dialect")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_accepted_children(conn: &Connection, word: &mut AcceptedWord) -> RepoResult<()> {
    let id = word.uuid.to_string();
    word.contributors = load_user_ids(
        conn,
        "SELECT user_id
         FROM accepted_word_contributors
         WHERE word_uuid = ?1
         ORDER BY user_id ASC;",
        [id.as_str()],
    )?;
    word.themes = load_strings(
        conn,
        "SELECT theme
         FROM accepted_word_themes
         WHERE word_uuid = ?1
         ORDER BY theme ASC;",
        [id.as_str()],
    )?;

    let (own_column, other_column) = match word.language {
        Language::Russian => ("russian_uuid", "buryat_uuid"),
        Language::Buryat => ("buryat_uuid", "russian_uuid"),
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT russian_uuid, buryat_uuid
         FROM word_translations
         WHERE {own_column} = ?1
         ORDER BY created_at ASC, {other_column} ASC;"
    ))?;
    let mut rows = stmt.query([id.as_str()])?;
    while let Some(row) = rows.next()? {
        let russian: String = row.get(0)?;
        let buryat: String = row.get(1)?;
        let other = match word.language {
            Language::Russian => buryat.as_str(),
            Language::Buryat => russian.as_str(),
        };
        let translation = parse_uuid(other, "word_translations")?;
        let contributors = load_user_ids(
            conn,
            "SELECT user_id
             FROM word_translation_contributors
             WHERE russian_uuid = ?1
               AND buryat_uuid = ?2
             ORDER BY user_id ASC;",
            params![russian, buryat],
        )?;
        word.translations.push(translation);
        word.translations_u.push(TranslationContribution {
            translation,
            contributors,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_guards_wildcards() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
        assert_eq!(escape_like("дом"), "дом");
    }
}
