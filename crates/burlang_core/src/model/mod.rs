//! Vocabulary domain model.
//!
//! # Responsibility
//! - Define the canonical records for accepted/suggested words, users and
//!   search history shared by repositories and handlers.
//! - Own text normalization, the identity key for every word collection.
//!
//! # Invariants
//! - `normalized_text` is unique per language inside each collection.
//! - Translation links always join one Russian and one Buryat word.

pub mod language;
pub mod search;
pub mod user;
pub mod word;
