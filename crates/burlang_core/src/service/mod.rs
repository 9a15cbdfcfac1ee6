//! Vocabulary use cases.
//!
//! # Responsibility
//! - Turn repository calls into transactional use cases.
//! - Keep front ends decoupled from storage details.
//!
//! Write handlers open one immediate transaction per call; repositories
//! only ever see the transaction's connection.

pub mod acceptance;
pub mod error;
pub mod find_translation;
pub(crate) mod guard;
pub mod listing;
pub mod suggest;
pub mod users;
pub mod vocabulary_service;
