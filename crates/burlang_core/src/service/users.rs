//! Registration, profiles, permissions and the rating leaderboard.

use crate::model::user::{Permission, TelegramUser, UserId};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::word_repo::RepoResult;
use crate::service::error::{VocabularyError, VocabularyResult};
use crate::service::guard::{begin_immediate, require_permission, require_user};
use rusqlite::Connection;

pub struct UserHandler<'conn> {
    conn: &'conn Connection,
}

impl<'conn> UserHandler<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates the user or refreshes its display names.
    pub fn register(
        &self,
        id: UserId,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> VocabularyResult<TelegramUser> {
        let users = SqliteUserRepository::try_new(self.conn)?;
        Ok(users.upsert_user(id, clean(username), clean(first_name))?)
    }

    pub fn profile(&self, id: UserId) -> VocabularyResult<TelegramUser> {
        require_user(&SqliteUserRepository::try_new(self.conn)?, id)
    }

    /// Grants `permission` to `target`. `actor` must be an admin.
    ///
    /// Returns the target as stored afterwards.
    pub fn grant_permission(
        &self,
        actor: UserId,
        target: UserId,
        permission: Permission,
    ) -> VocabularyResult<TelegramUser> {
        self.change_permission(actor, target, |users| {
            users.grant_permission(target, permission)
        })
    }

    pub fn revoke_permission(
        &self,
        actor: UserId,
        target: UserId,
        permission: Permission,
    ) -> VocabularyResult<TelegramUser> {
        self.change_permission(actor, target, |users| {
            users.revoke_permission(target, permission)
        })
    }

    /// Makes `id` an admin when the database has no admin yet.
    ///
    /// Fails `PermissionDenied` once any admin exists.
    pub fn claim_first_admin(&self, id: UserId) -> VocabularyResult<TelegramUser> {
        let tx = begin_immediate(self.conn)?;
        let users = SqliteUserRepository::try_new(&tx)?;
        require_user(&users, id)?;
        if users.count_with_permission(Permission::Admin)? > 0 {
            return Err(VocabularyError::PermissionDenied {
                user: id,
                required: Permission::Admin,
            });
        }
        users.grant_permission(id, Permission::Admin)?;
        let user = require_user(&users, id)?;

        tx.commit()?;
        Ok(user)
    }

    pub fn leaderboard(&self, limit: u32) -> VocabularyResult<Vec<TelegramUser>> {
        let users = SqliteUserRepository::try_new(self.conn)?;
        Ok(users.list_top_users(limit)?)
    }

    fn change_permission<F>(
        &self,
        actor: UserId,
        target: UserId,
        change: F,
    ) -> VocabularyResult<TelegramUser>
    where
        F: FnOnce(&SqliteUserRepository<'_>) -> RepoResult<bool>,
    {
        let tx = begin_immediate(self.conn)?;
        let users = SqliteUserRepository::try_new(&tx)?;
        let actor = require_user(&users, actor)?;
        require_permission(&actor, Permission::Admin)?;

        change(&users)?;
        let target = require_user(&users, target)?;

        tx.commit()?;
        Ok(target)
    }
}

fn clean(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
