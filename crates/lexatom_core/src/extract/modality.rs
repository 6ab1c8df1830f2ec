//! Modal phrase detection.
//!
//! # Responsibility
//! - Find the first modal phrase in a clause and classify its force.
//!
//! # Invariants
//! - `MODAL_PATTERNS` order is the precedence contract: longer, more
//!   specific phrases are listed before their shorter prefixes ("does
//!   not apply" and "must not" before "must"). Reordering this table
//!   silently changes identity hashes against historical fixtures —
//!   never do it.
//! - The scan is earliest-position-wins: at each token position the
//!   table is tried top to bottom, and the first pattern matching at
//!   the earliest position is the clause's modality.

use crate::model::obligation::ObligationType;

/// One modal phrase with its normative classification.
#[derive(Debug, Clone, Copy)]
pub struct ModalPattern {
    pub phrase: &'static str,
    pub obligation_type: ObligationType,
}

const fn pattern(phrase: &'static str, obligation_type: ObligationType) -> ModalPattern {
    ModalPattern {
        phrase,
        obligation_type,
    }
}

/// The ordered precedence table. Order is load-bearing.
pub const MODAL_PATTERNS: &[ModalPattern] = &[
    pattern("does not apply", ObligationType::Exclusion),
    pattern("do not apply", ObligationType::Exclusion),
    pattern("is not required to", ObligationType::Permission),
    pattern("must not", ObligationType::Prohibition),
    pattern("shall not", ObligationType::Prohibition),
    pattern("may not", ObligationType::Prohibition),
    pattern("need not", ObligationType::Permission),
    pattern("is required to", ObligationType::Obligation),
    pattern("is entitled to", ObligationType::Permission),
    pattern("ought to", ObligationType::Obligation),
    pattern("cannot", ObligationType::Prohibition),
    pattern("must", ObligationType::Obligation),
    pattern("shall", ObligationType::Obligation),
    pattern("should", ObligationType::Obligation),
    pattern("may", ObligationType::Permission),
];

/// A modal match within one clause, in clause-relative token offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalMatch {
    pub obligation_type: ObligationType,
    pub phrase: &'static str,
    /// Half-open clause-relative token range of the matched phrase.
    pub start: usize,
    pub end: usize,
}

/// Scans normalized clause tokens for the first modal phrase.
///
/// Returns `None` when the clause carries no modality — which is a
/// plain "no obligation here", never an error.
pub fn find_modal(normalized: &[String]) -> Option<ModalMatch> {
    for start in 0..normalized.len() {
        for pattern in MODAL_PATTERNS {
            if let Some(end) = match_at(normalized, start, pattern.phrase) {
                return Some(ModalMatch {
                    obligation_type: pattern.obligation_type,
                    phrase: pattern.phrase,
                    start,
                    end,
                });
            }
        }
    }
    None
}

/// Matches a multi-word phrase at `start`; returns the end offset.
fn match_at(normalized: &[String], start: usize, phrase: &str) -> Option<usize> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if start + words.len() > normalized.len() {
        return None;
    }
    for (offset, word) in words.iter().enumerate() {
        if normalized[start + offset] != *word {
            return None;
        }
    }
    Some(start + words.len())
}
