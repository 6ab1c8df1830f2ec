//! Statutory reference models.
//!
//! # Responsibility
//! - Define the raw reference mention input and its derived identity.
//!
//! # Invariants
//! - `ReferenceIdentity` is a pure, idempotent function of normalized
//!   reference fields (computed in `identity`); equal canonical fields
//!   always produce equal hashes.

use serde::{Deserialize, Serialize};

/// Raw statutory reference fields as supplied by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleReference {
    /// Cited work, e.g. `"Privacy Act 1988 (Cth)"`.
    pub work: String,
    /// Section designator, e.g. `"13G"`.
    #[serde(default)]
    pub section: Option<String>,
    /// Pinpoint within the section, e.g. `"(2)(a)"`.
    #[serde(default)]
    pub pinpoint: Option<String>,
}

impl RuleReference {
    pub fn new(work: impl Into<String>) -> Self {
        Self {
            work: work.into(),
            section: None,
            pinpoint: None,
        }
    }
}

/// Canonical identity derived from a [`RuleReference`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceIdentity {
    /// Lowercased, trimmed work string.
    pub work: String,
    pub section: Option<String>,
    pub pinpoint: Option<String>,
    /// Work string with years and punctuation stripped; groups
    /// revisions of the same work under one key.
    pub family_key: String,
    /// First four-digit year found in the canonical work string.
    pub year: Option<String>,
    /// Jurisdiction keyword found in the canonical work string.
    pub jurisdiction_hint: Option<String>,
    pub identity_hash: String,
}

/// A reference mention already resolved by a collaborator, carrying
/// its identity hash and clause provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMention {
    pub identity_hash: String,
    pub clause_id: String,
    pub text: String,
}
