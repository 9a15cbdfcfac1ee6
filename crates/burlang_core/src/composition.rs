//! Composition root.
//!
//! # Responsibility
//! - Wire handlers and policies from [`CoreConfig`] into a [`VocabularyService`].
//! - Open the configured database and start file logging for front ends.

use crate::config::CoreConfig;
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{init_logging, LoggingError};
use crate::service::acceptance::AcceptanceHandler;
use crate::service::find_translation::FindTranslationHandler;
use crate::service::listing::ListingHandler;
use crate::service::suggest::SuggestTranslationHandler;
use crate::service::users::UserHandler;
use crate::service::vocabulary_service::VocabularyService;
use rusqlite::Connection;

/// Builds the facade over an already migrated connection.
pub fn compose<'conn>(conn: &'conn Connection, config: &CoreConfig) -> VocabularyService<'conn> {
    VocabularyService::new(
        AcceptanceHandler::new(conn, config.rating, config.moderation),
        SuggestTranslationHandler::new(conn, config.rating),
        FindTranslationHandler::new(conn),
        ListingHandler::new(conn, config.page),
        UserHandler::new(conn),
    )
}

/// Owns the connection a [`VocabularyService`] borrows.
pub struct Composition {
    conn: Connection,
    config: CoreConfig,
}

impl Composition {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn service(&self) -> VocabularyService<'_> {
        compose(&self.conn, &self.config)
    }
}

/// Opens `config.database_path` (in-memory when unset) and keeps the
/// config for later [`Composition::service`] calls.
pub fn open_and_compose(config: &CoreConfig) -> DbResult<Composition> {
    let conn = match &config.database_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    Ok(Composition {
        conn,
        config: config.clone(),
    })
}

/// Starts rolling file logs when `config.log_dir` is set.
///
/// Returns `false` when file logging is disabled.
pub fn init_logging_from(config: &CoreConfig) -> Result<bool, LoggingError> {
    match &config.log_dir {
        Some(dir) => init_logging(&config.log_level, dir).map(|()| true),
        None => Ok(false),
    }
}
