//! Canonical records and identity hashes.
//!
//! # Responsibility
//! - Compute reproducible SHA-1 identities for obligations and
//!   statutory references from canonical field payloads.
//! - Provide the single obligation-to-record serialization used by
//!   export, diff and alignment.
//!
//! # Invariants
//! - Canonical payloads serialize with sorted keys and no incidental
//!   whitespace; equal canonical fields always hash equal.
//! - Scope and lifecycle data are descriptive and excluded from the
//!   obligation hash.
//! - This layer performs no I/O and is total over well-formed input.

use crate::model::obligation::ObligationAtom;
use crate::model::reference::{ReferenceIdentity, RuleReference};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use sha1::{Digest, Sha1};

static YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(1[89]\d{2}|20\d{2})\b")
        .unwrap_or_else(|err| unreachable!("invalid year pattern: {err}"))
});

static JURISDICTION: Lazy<Regex> = Lazy::new(|| {
    // "act" is deliberately absent: it would collide with the word
    // `Act` present in nearly every work title.
    Regex::new(r"\b(cth|commonwealth|federal|nsw|vic|victoria|qld|queensland|wa|sa|tas|nt)\b")
        .unwrap_or_else(|err| unreachable!("invalid jurisdiction pattern: {err}"))
});

/// Hex-encoded SHA-1 of arbitrary bytes.
pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Serializes a JSON value canonically: sorted keys (the default
/// `serde_json` map is ordered), compact separators.
fn canonical_json(value: &Value) -> String {
    value.to_string()
}

/// Derived obligation identity; never stored, always recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObligationIdentity {
    pub obligation_type: String,
    pub modality: String,
    pub actor: Option<String>,
    pub action: Option<String>,
    pub object: Option<String>,
    pub reference_hashes: Vec<String>,
    pub condition_types: Vec<String>,
    /// Ordinal position; carried for consumers, excluded from the hash
    /// so numbering noise cannot shift identity.
    pub clause_index: usize,
    pub identity_hash: String,
}

/// Computes the canonical identity of one obligation.
pub fn compute_obligation_identity(
    obligation: &ObligationAtom,
    clause_index: usize,
) -> ObligationIdentity {
    let actor = obligation
        .actor
        .as_ref()
        .map(|phrase| phrase.normalized.clone());
    let action = obligation
        .action
        .as_ref()
        .map(|phrase| phrase.normalized.clone());
    let object = obligation
        .object
        .as_ref()
        .map(|phrase| phrase.normalized.clone());
    let reference_hashes = obligation.sorted_reference_hashes();
    let condition_types: Vec<String> = obligation
        .condition_types()
        .into_iter()
        .map(str::to_string)
        .collect();

    let payload = json!({
        "type": obligation.obligation_type.as_str(),
        "modality": &obligation.modality,
        "actor": &actor,
        "action": &action,
        "object": &object,
        "references": &reference_hashes,
        "conditions": &condition_types,
    });
    let identity_hash = sha1_hex(canonical_json(&payload).as_bytes());

    ObligationIdentity {
        obligation_type: obligation.obligation_type.as_str().to_string(),
        modality: obligation.modality.clone(),
        actor,
        action,
        object,
        reference_hashes,
        condition_types,
        clause_index,
        identity_hash,
    }
}

/// Identities for a whole obligation list, ordinal by list position.
pub fn obligation_identities(obligations: &[ObligationAtom]) -> Vec<ObligationIdentity> {
    obligations
        .iter()
        .enumerate()
        .map(|(index, obligation)| compute_obligation_identity(obligation, index))
        .collect()
}

/// The canonical obligation record used by export, diff and alignment.
/// All obligation serialization funnels through here.
pub fn obligation_record(obligation: &ObligationAtom) -> Value {
    let phrase = |value: &Option<crate::model::obligation::ClausePhrase>| match value {
        Some(phrase) => json!({
            "text": &phrase.text,
            "normalized": &phrase.normalized,
            "span": [phrase.span.0, phrase.span.1],
        }),
        None => Value::Null,
    };
    let conditions: Vec<Value> = obligation
        .conditions
        .iter()
        .map(|condition| {
            json!({
                "trigger": condition.trigger.as_str(),
                "text": &condition.text,
                "normalized": &condition.normalized,
                "span": [condition.span.0, condition.span.1],
            })
        })
        .collect();
    let scopes: Vec<Value> = obligation
        .scopes
        .iter()
        .map(|scope| {
            json!({
                "category": scope.category.as_str(),
                "text": &scope.text,
                "normalized": &scope.normalized,
                "span": [scope.span.0, scope.span.1],
            })
        })
        .collect();
    let lifecycle: Vec<Value> = obligation
        .lifecycle
        .iter()
        .map(|trigger| {
            json!({
                "kind": trigger.kind.as_str(),
                "text": &trigger.text,
                "normalized": &trigger.normalized,
                "span": [trigger.span.0, trigger.span.1],
            })
        })
        .collect();

    json!({
        "type": obligation.obligation_type.as_str(),
        "modality": &obligation.modality,
        "clause_id": &obligation.clause_id,
        "actor": phrase(&obligation.actor),
        "action": phrase(&obligation.action),
        "object": phrase(&obligation.object),
        "reference_identities": obligation.sorted_reference_hashes(),
        "conditions": conditions,
        "scopes": scopes,
        "lifecycle": lifecycle,
        "span": [obligation.span.0, obligation.span.1],
        "provenance": {
            "source_id": &obligation.source_id,
            "clause_id": &obligation.clause_id,
        },
    })
}

/// Canonical identity of a statutory reference. Pure and idempotent:
/// re-deriving from the same fields always yields the same hash.
pub fn reference_identity(reference: &RuleReference) -> ReferenceIdentity {
    let work = reference.work.trim().to_lowercase();
    let year = YEAR.find(&work).map(|found| found.as_str().to_string());
    let jurisdiction_hint = JURISDICTION
        .find(&work)
        .map(|found| found.as_str().to_string());
    let family_key = family_key_of(&work);
    let section = reference.section.as_ref().map(|value| value.trim().to_string());
    let pinpoint = reference
        .pinpoint
        .as_ref()
        .map(|value| value.trim().to_string());

    let payload = json!({
        "work": &work,
        "section": &section,
        "pinpoint": &pinpoint,
        "family_key": &family_key,
        "year": &year,
        "jurisdiction_hint": &jurisdiction_hint,
    });
    let identity_hash = sha1_hex(canonical_json(&payload).as_bytes());

    ReferenceIdentity {
        work,
        section,
        pinpoint,
        family_key,
        year,
        jurisdiction_hint,
        identity_hash,
    }
}

/// Family key: the canonical work string with years and punctuation
/// removed and whitespace collapsed, grouping revisions of one work.
fn family_key_of(work: &str) -> String {
    let without_years = YEAR.replace_all(work, " ");
    let cleaned: String = without_years
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch.is_whitespace() {
                ch
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
