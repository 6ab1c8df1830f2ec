//! Literal fact-to-trigger activation simulation.
//!
//! # Responsibility
//! - Classify each obligation as inactive, active or terminated from
//!   literal matches between lifecycle cues and fact keys.
//!
//! # Invariants
//! - Termination is checked, and wins, before activation — per
//!   obligation.
//! - Obligations with no lifecycle triggers stay inactive.
//! - A match is exact or prefix (either direction) on normalized text;
//!   nothing else activates anything. No compliance semantics exist
//!   here.

use crate::identity::obligation_identities;
use crate::model::fact::{Fact, FactEnvelope, SUPPORTED_FACT_ENVELOPE_VERSION};
use crate::model::obligation::{LifecycleKind, ObligationAtom};
use crate::model::token::normalize_token_text;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const PAYLOAD_VERSION: u32 = 1;

/// Result type for activation simulation.
pub type ActivationResult<T> = Result<T, ActivationError>;

/// Boundary error for unsupported fact envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationError {
    /// Envelope version this binary does not understand.
    UnsupportedVersion { version: u32, supported: u32 },
}

impl Display for ActivationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedVersion { version, supported } => write!(
                f,
                "unsupported fact envelope version {version}; supported {supported}"
            ),
        }
    }
}

impl Error for ActivationError {}

/// One literal trigger-to-fact match explaining a state decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReason {
    /// Lifecycle kind that fired: `activation` or `termination`.
    pub trigger: String,
    /// Trigger cue text as extracted.
    pub text: String,
    pub fact_key: String,
    pub fact_value: String,
}

/// Activation payload; all id lists sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub version: u32,
    pub active: Vec<String>,
    pub inactive: Vec<String>,
    pub terminated: Vec<String>,
    pub reasons: BTreeMap<String, Vec<ActivationReason>>,
}

/// Simulates activation of each obligation against the fact envelope.
///
/// Independent across obligations; the envelope version is validated
/// here at the boundary, never deeper in the pipeline.
pub fn simulate_activation(
    obligations: &[ObligationAtom],
    envelope: &FactEnvelope,
) -> ActivationResult<ActivationReport> {
    if envelope.version != SUPPORTED_FACT_ENVELOPE_VERSION {
        return Err(ActivationError::UnsupportedVersion {
            version: envelope.version,
            supported: SUPPORTED_FACT_ENVELOPE_VERSION,
        });
    }

    let identities = obligation_identities(obligations);
    let mut active = Vec::new();
    let mut inactive = Vec::new();
    let mut terminated = Vec::new();
    let mut reasons: BTreeMap<String, Vec<ActivationReason>> = BTreeMap::new();

    for (identity, obligation) in identities.iter().zip(obligations) {
        let hash = identity.identity_hash.clone();

        let termination_matches =
            kind_matches(obligation, LifecycleKind::Termination, &envelope.facts);
        if !termination_matches.is_empty() {
            terminated.push(hash.clone());
            reasons.insert(hash, termination_matches);
            continue;
        }

        let activation_matches =
            kind_matches(obligation, LifecycleKind::Activation, &envelope.facts);
        if !activation_matches.is_empty() {
            active.push(hash.clone());
            reasons.insert(hash, activation_matches);
            continue;
        }

        inactive.push(hash);
    }

    active.sort();
    active.dedup();
    inactive.sort();
    inactive.dedup();
    terminated.sort();
    terminated.dedup();

    Ok(ActivationReport {
        version: PAYLOAD_VERSION,
        active,
        inactive,
        terminated,
        reasons,
    })
}

/// All literal matches between one trigger kind and the fact list, in
/// trigger order then fact order.
fn kind_matches(
    obligation: &ObligationAtom,
    kind: LifecycleKind,
    facts: &[Fact],
) -> Vec<ActivationReason> {
    let mut matches = Vec::new();
    for trigger in obligation
        .lifecycle
        .iter()
        .filter(|trigger| trigger.kind == kind)
    {
        for fact in facts {
            if trigger_matches_fact(&trigger.normalized, &fact.key) {
                matches.push(ActivationReason {
                    trigger: kind.as_str().to_string(),
                    text: trigger.text.clone(),
                    fact_key: fact.key.clone(),
                    fact_value: fact.value.clone(),
                });
            }
        }
    }
    matches
}

/// Exact match, or one side a prefix of the other, over normalized
/// text. Empty strings never match.
fn trigger_matches_fact(trigger_normalized: &str, fact_key: &str) -> bool {
    let trigger = trigger_normalized.trim();
    let key = normalize_token_text(fact_key.trim());
    if trigger.is_empty() || key.is_empty() {
        return false;
    }
    trigger == key || trigger.starts_with(&key) || key.starts_with(trigger)
}
