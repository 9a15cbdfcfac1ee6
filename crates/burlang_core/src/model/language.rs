//! Language pair and text normalization.
//!
//! # Invariants
//! - `normalize_text` is idempotent.
//! - Buryat-specific letters (`ү`, `ө`, `һ`) survive normalization.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// One side of the Buryat-Russian pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Russian,
    Buryat,
}

impl Language {
    /// Returns the language translations are linked to.
    pub fn opposite(self) -> Self {
        match self {
            Self::Russian => Self::Buryat,
            Self::Buryat => Self::Russian,
        }
    }

    pub fn as_db(self) -> &'static str {
        match self {
            Self::Russian => "russian",
            Self::Buryat => "buryat",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "russian" => Some(Self::Russian),
            "buryat" => Some(Self::Buryat),
            _ => None,
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "russian" | "ru" => Ok(Self::Russian),
            "buryat" | "bua" | "bxr" => Ok(Self::Buryat),
            other => Err(format!(
                "unsupported language `{other}`; expected russian|buryat"
            )),
        }
    }
}

/// Builds the collection key for a word or query.
///
/// Rules:
/// - lowercase, surrounding punctuation stripped, inner whitespace collapsed;
/// - Russian folds `ё` into `е`.
pub fn normalize_text(language: Language, text: &str) -> String {
    let lowered = text.to_lowercase();
    let folded = match language {
        Language::Russian => lowered.replace('ё', "е"),
        Language::Buryat => lowered,
    };
    let collapsed = WHITESPACE_RE.replace_all(&folded, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || is_edge_punctuation(c))
        .to_string()
}

fn is_edge_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() || matches!(c, '«' | '»' | '„' | '“' | '”' | '…' | '—' | '–')
}

#[cfg(test)]
mod tests {
    use super::{normalize_text, Language};

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(
            normalize_text(Language::Russian, "  Большой   Дом "),
            "большой дом"
        );
    }

    #[test]
    fn normalize_folds_yo_only_for_russian() {
        assert_eq!(normalize_text(Language::Russian, "Ёлка"), "елка");
        assert_eq!(normalize_text(Language::Buryat, "Ёлка"), "ёлка");
    }

    #[test]
    fn normalize_keeps_buryat_letters_and_strips_edge_punctuation() {
        assert_eq!(normalize_text(Language::Buryat, "«Һайн үдэр!»"), "һайн үдэр");
        assert_eq!(normalize_text(Language::Buryat, "өөрөө"), "өөрөө");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize_text(Language::Russian, " «Ёж, ёжик...» ");
        assert_eq!(normalize_text(Language::Russian, &once), once);
    }

    #[test]
    fn language_parses_aliases_and_flips() {
        assert_eq!("RU".parse::<Language>(), Ok(Language::Russian));
        assert_eq!("bxr".parse::<Language>(), Ok(Language::Buryat));
        assert!("english".parse::<Language>().is_err());
        assert_eq!(Language::Russian.opposite(), Language::Buryat);
    }
}
