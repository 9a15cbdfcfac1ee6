//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define per-collection data access contracts (accepted, suggested,
//!   users, search history).
//! - Isolate SQL details from the handler transaction scripts.
//!
//! # Invariants
//! - Repositories never open transactions themselves; handlers wrap
//!   multi-collection work and pass the transaction in as a connection.
//! - Repository APIs return semantic errors (`WordNotFound`,
//!   `SuggestionNotFound`, `UserNotFound`) in addition to DB transport errors.

pub mod search_repo;
pub mod suggestion_repo;
pub mod user_repo;
pub mod word_repo;
