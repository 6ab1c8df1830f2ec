//! Token input model.
//!
//! # Responsibility
//! - Define the per-token record consumed by the tree builder and the
//!   obligation extractor.
//! - Provide the documented plain-text fallback when no tagger output
//!   is available.
//!
//! # Invariants
//! - Tag fields are optional; absent tags never change how a token's
//!   surface text is normalized.
//! - Normalization is pure: strip trailing `. , ; :`, then lowercase.

use serde::{Deserialize, Serialize};

/// One input token with optional tagger metadata.
///
/// Collaborators that run a tagger supply lemma/POS/dependency/entity
/// fields; collaborators that do not can use [`tokenize_plain`], which
/// leaves every tag empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Surface text exactly as it appeared in the source stream.
    pub text: String,
    /// Optional lemma from an upstream tagger.
    #[serde(default)]
    pub lemma: Option<String>,
    /// Optional coarse part-of-speech tag (e.g. `VERB`, `AUX`).
    #[serde(default)]
    pub pos: Option<String>,
    /// Optional dependency label (e.g. `ROOT`).
    #[serde(default)]
    pub dependency: Option<String>,
    /// Optional named-entity type; non-empty marks a reference token.
    #[serde(default)]
    pub entity_type: Option<String>,
}

impl Token {
    /// Creates an untagged token from surface text.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lemma: None,
            pos: None,
            dependency: None,
            entity_type: None,
        }
    }

    /// Returns the lemma when present, else the surface text.
    pub fn lemma_or_text(&self) -> &str {
        match self.lemma.as_deref() {
            Some(lemma) if !lemma.is_empty() => lemma,
            _ => self.text.as_str(),
        }
    }

    /// Returns the normalized surface form used for lexicon matching.
    pub fn normalized(&self) -> String {
        normalize_token_text(&self.text)
    }

    /// Returns the normalized lemma form used for lexicon matching.
    pub fn normalized_lemma(&self) -> String {
        normalize_token_text(self.lemma_or_text())
    }

    /// Returns whether this token ends a clause.
    ///
    /// A clause boundary is `.`, `;`, or any token whose surface text
    /// ends in one of those characters.
    pub fn is_clause_boundary(&self) -> bool {
        self.text.ends_with('.') || self.text.ends_with(';')
    }

    /// Returns whether a non-empty entity type is attached.
    pub fn has_entity(&self) -> bool {
        matches!(self.entity_type.as_deref(), Some(value) if !value.is_empty())
    }

    /// Case-insensitive part-of-speech comparison.
    pub fn pos_is(&self, tag: &str) -> bool {
        matches!(&self.pos, Some(value) if value.eq_ignore_ascii_case(tag))
    }

    /// Case-insensitive dependency-label comparison.
    pub fn dependency_is(&self, label: &str) -> bool {
        matches!(&self.dependency, Some(value) if value.eq_ignore_ascii_case(label))
    }
}

/// Normalizes one surface form: strip trailing `. , ; :`, lowercase.
pub fn normalize_token_text(text: &str) -> String {
    text.trim_end_matches(['.', ',', ';', ':']).to_lowercase()
}

/// Fallback tokenizer: plain whitespace split with empty tags.
///
/// This is the documented degraded mode for callers without a tagger;
/// classification then falls through to lexicon matches and `TOKEN`.
pub fn tokenize_plain(text: &str) -> Vec<Token> {
    text.split_whitespace().map(Token::new).collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_token_text, tokenize_plain, Token};

    #[test]
    fn normalization_strips_trailing_punctuation_and_lowercases() {
        assert_eq!(normalize_token_text("Records."), "records");
        assert_eq!(normalize_token_text("apply;"), "apply");
        assert_eq!(normalize_token_text("Act,"), "act");
        assert_eq!(normalize_token_text("scope:"), "scope");
    }

    #[test]
    fn normalization_keeps_internal_punctuation() {
        assert_eq!(normalize_token_text("s.12(1)"), "s.12(1)");
    }

    #[test]
    fn plain_tokenizer_leaves_tags_empty() {
        let tokens = tokenize_plain("The operator must keep records.");
        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().all(|token| token.pos.is_none()));
        assert!(tokens[4].is_clause_boundary());
    }

    #[test]
    fn lemma_falls_back_to_surface_text() {
        let mut token = Token::new("keeps");
        assert_eq!(token.lemma_or_text(), "keeps");
        token.lemma = Some("keep".to_string());
        assert_eq!(token.lemma_or_text(), "keep");
        assert_eq!(token.normalized_lemma(), "keep");
    }
}
