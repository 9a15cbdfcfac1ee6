//! Telegram user repository.
//!
//! # Invariants
//! - Upserts never reset `rating` or permissions.
//! - Rating changes are relative (`rating + delta`) so concurrent writers
//!   inside separate transactions do not lose updates.

use crate::model::user::{Permission, TelegramUser, UserId};
use crate::repo::word_repo::{ensure_schema_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    id,
    username,
    first_name,
    rating,
    created_at,
    updated_at
FROM telegram_users";

pub trait UserRepository {
    /// Inserts a user or refreshes its display fields.
    fn upsert_user(
        &self,
        id: UserId,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> RepoResult<TelegramUser>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<TelegramUser>>;
    /// Applies `delta` and returns the new rating.
    fn adjust_rating(&self, id: UserId, delta: i64) -> RepoResult<i64>;
    /// Returns `true` when the permission was newly granted.
    fn grant_permission(&self, id: UserId, permission: Permission) -> RepoResult<bool>;
    /// Returns `true` when the permission was held and is now removed.
    fn revoke_permission(&self, id: UserId, permission: Permission) -> RepoResult<bool>;
    fn count_with_permission(&self, permission: Permission) -> RepoResult<u64>;
    /// Ordered by `rating DESC, id ASC`.
    fn list_top_users(&self, limit: u32) -> RepoResult<Vec<TelegramUser>>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn require_user(&self, id: UserId) -> RepoResult<TelegramUser> {
        self.get_user(id)?.ok_or(RepoError::UserNotFound(id))
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn upsert_user(
        &self,
        id: UserId,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> RepoResult<TelegramUser> {
        self.conn.execute(
            "INSERT INTO telegram_users (id, username, first_name)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![id, username, first_name],
        )?;
        self.require_user(id)
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<TelegramUser>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            let mut user = parse_user_row(row)?;
            user.permissions = load_permissions(self.conn, id)?;
            return Ok(Some(user));
        }
        Ok(None)
    }

    fn adjust_rating(&self, id: UserId, delta: i64) -> RepoResult<i64> {
        self.conn
            .query_row(
                "UPDATE telegram_users
                 SET rating = rating + ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?1
                 RETURNING rating;",
                params![id, delta],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(RepoError::UserNotFound(id))
    }

    fn grant_permission(&self, id: UserId, permission: Permission) -> RepoResult<bool> {
        self.require_user(id)?;
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO user_permissions (user_id, permission) VALUES (?1, ?2);",
            params![id, permission.as_db()],
        )?;
        Ok(changed > 0)
    }

    fn revoke_permission(&self, id: UserId, permission: Permission) -> RepoResult<bool> {
        self.require_user(id)?;
        let changed = self.conn.execute(
            "DELETE FROM user_permissions WHERE user_id = ?1 AND permission = ?2;",
            params![id, permission.as_db()],
        )?;
        Ok(changed > 0)
    }

    fn count_with_permission(&self, permission: Permission) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM user_permissions WHERE permission = ?1;",
            [permission.as_db()],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn list_top_users(&self, limit: u32) -> RepoResult<Vec<TelegramUser>> {
        let mut stmt = self.conn.prepare(&format!(
            "{USER_SELECT_SQL} ORDER BY rating DESC, id ASC LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            let mut user = parse_user_row(row)?;
            user.permissions = load_permissions(self.conn, user.id)?;
            users.push(user);
        }
        Ok(users)
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<TelegramUser> {
    Ok(TelegramUser {
        id: row.get("id")?,
        username: row.get("username")?,
        first_name: row.get("first_name")?,
        rating: row.get("rating")?,
        permissions: Vec::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn load_permissions(conn: &Connection, id: UserId) -> RepoResult<Vec<Permission>> {
    let mut stmt = conn.prepare(
        "SELECT permission
         FROM user_permissions
         WHERE user_id = ?1
         ORDER BY permission ASC;",
    )?;
    let mut rows = stmt.query([id])?;
    let mut permissions = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        let permission = Permission::from_db(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid permission `{value}` in user_permissions.permission"
            ))
        })?;
        permissions.push(permission);
    }
    permissions.sort();
    Ok(permissions)
}
