//! Obligation atoms and their owned value types.
//!
//! # Responsibility
//! - Define the clause-scoped normative record produced by extraction.
//! - Keep every atom literally traceable to an input token span.
//!
//! # Invariants
//! - An `ObligationAtom` is owned by the clause that produced it and is
//!   immutable once built; views, diffs and activation read it only.
//! - `reference_identities` contains caller-supplied hashes only —
//!   extraction never invents a reference.

use crate::model::node::TokenSpan;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Normative force classification derived from the modal phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationType {
    Obligation,
    Permission,
    Prohibition,
    Exclusion,
}

impl ObligationType {
    /// Stable payload spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Obligation => "obligation",
            Self::Permission => "permission",
            Self::Prohibition => "prohibition",
            Self::Exclusion => "exclusion",
        }
    }
}

/// A contiguous clause-local phrase with its normalized form.
///
/// Shared value shape for actor, action and object bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClausePhrase {
    pub text: String,
    pub normalized: String,
    pub span: TokenSpan,
    pub clause_id: String,
}

/// Which lexicon produced a condition atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTriggerKind {
    Condition,
    Exception,
}

impl ConditionTriggerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Condition => "condition",
            Self::Exception => "exception",
        }
    }
}

/// One condition/exception trigger token found in the clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionAtom {
    pub trigger: ConditionTriggerKind,
    pub text: String,
    pub normalized: String,
    pub span: TokenSpan,
    pub clause_id: String,
}

/// Scope classification; descriptive only, excluded from identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeCategory {
    Time,
    Place,
    Context,
}

impl ScopeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Place => "place",
            Self::Context => "context",
        }
    }
}

/// One time/place/context phrase attached to an obligation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeAtom {
    pub category: ScopeCategory,
    pub text: String,
    pub normalized: String,
    pub span: TokenSpan,
    pub clause_id: String,
}

/// Lifecycle cue direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleKind {
    Activation,
    Termination,
}

impl LifecycleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::Termination => "termination",
        }
    }
}

/// One explicit activation/termination cue window.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LifecycleTrigger {
    pub kind: LifecycleKind,
    pub text: String,
    pub normalized: String,
    pub span: TokenSpan,
    pub clause_id: String,
}

/// The clause-scoped normative assertion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationAtom {
    #[serde(rename = "type")]
    pub obligation_type: ObligationType,
    /// Surface modal phrase that classified this obligation.
    pub modality: String,
    pub clause_id: String,
    pub actor: Option<ClausePhrase>,
    pub action: Option<ClausePhrase>,
    pub object: Option<ClausePhrase>,
    /// Caller-supplied reference identity hashes; sorted by `BTreeSet`.
    pub reference_identities: BTreeSet<String>,
    pub conditions: Vec<ConditionAtom>,
    pub scopes: Vec<ScopeAtom>,
    pub lifecycle: Vec<LifecycleTrigger>,
    /// Owning clause span in the source token stream.
    pub span: TokenSpan,
    pub source_id: String,
}

impl ObligationAtom {
    /// Sorted condition trigger-kind names, duplicates removed.
    pub fn condition_types(&self) -> Vec<&'static str> {
        let kinds: BTreeSet<ConditionTriggerKind> = self
            .conditions
            .iter()
            .map(|condition| condition.trigger)
            .collect();
        kinds.into_iter().map(ConditionTriggerKind::as_str).collect()
    }

    /// Sorted reference hashes as a vector.
    pub fn sorted_reference_hashes(&self) -> Vec<String> {
        self.reference_identities.iter().cloned().collect()
    }
}
