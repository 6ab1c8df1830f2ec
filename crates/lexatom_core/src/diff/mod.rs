//! Revision diff and alignment over identity hashes.
//!
//! # Responsibility
//! - Classify obligations across two revisions by identity hash.
//! - Refine hash-equal pairs with a metadata-only secondary view.
//!
//! # Invariants
//! - Diff is pure set arithmetic over hashes; no text comparison.
//! - Alignment reports field-level changes only; it never rewrites or
//!   re-scores obligations.
//! - All obligation serialization goes through
//!   `identity::obligation_record`.

use crate::identity::{obligation_identities, obligation_record};
use crate::model::obligation::ObligationAtom;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

const PAYLOAD_VERSION: u32 = 1;

/// Hash-level difference between two revisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffReport {
    pub version: u32,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
}

/// One field-level drift on a hash-equal pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

/// A hash-equal pair whose metadata view drifted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifiedObligation {
    pub identity_hash: String,
    pub old: Value,
    pub new: Value,
    pub changes: Vec<FieldChange>,
}

/// Alignment payload: diff plus metadata refinement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentReport {
    pub version: u32,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
    pub modified: Vec<ModifiedObligation>,
}

/// Set-difference over identity hashes.
pub fn diff_obligations(old: &[ObligationAtom], new: &[ObligationAtom]) -> DiffReport {
    let old_hashes = hash_set(old);
    let new_hashes = hash_set(new);

    DiffReport {
        version: PAYLOAD_VERSION,
        added: sorted_difference(&new_hashes, &old_hashes),
        removed: sorted_difference(&old_hashes, &new_hashes),
        unchanged: sorted_intersection(&old_hashes, &new_hashes),
    }
}

/// Diff refined by a secondary metadata view for hash-equal pairs.
///
/// Any drift in actor/action/object text, modality, reference set,
/// scope set or lifecycle set reclassifies the pair as modified with
/// an explicit change list; true matches stay unchanged.
pub fn align_obligations(old: &[ObligationAtom], new: &[ObligationAtom]) -> AlignmentReport {
    let diff = diff_obligations(old, new);
    let old_by_hash = by_hash(old);
    let new_by_hash = by_hash(new);

    let mut unchanged = Vec::new();
    let mut modified = Vec::new();
    for hash in diff.unchanged {
        let (Some(old_atom), Some(new_atom)) = (old_by_hash.get(&hash), new_by_hash.get(&hash))
        else {
            continue;
        };
        let changes = metadata_changes(old_atom, new_atom);
        if changes.is_empty() {
            unchanged.push(hash);
        } else {
            modified.push(ModifiedObligation {
                identity_hash: hash,
                old: obligation_record(old_atom),
                new: obligation_record(new_atom),
                changes,
            });
        }
    }

    AlignmentReport {
        version: PAYLOAD_VERSION,
        added: diff.added,
        removed: diff.removed,
        unchanged,
        modified,
    }
}

/// The metadata view compared for hash-equal pairs. Field order here
/// is the order changes are reported in.
fn metadata_changes(old: &ObligationAtom, new: &ObligationAtom) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let mut compare = |field: &str, old_value: Value, new_value: Value| {
        if old_value != new_value {
            changes.push(FieldChange {
                field: field.to_string(),
                old: old_value,
                new: new_value,
            });
        }
    };

    compare("modality", old.modality.clone().into(), new.modality.clone().into());
    compare("actor", phrase_text(&old.actor), phrase_text(&new.actor));
    compare("action", phrase_text(&old.action), phrase_text(&new.action));
    compare("object", phrase_text(&old.object), phrase_text(&new.object));
    compare(
        "reference_identities",
        old.sorted_reference_hashes().into(),
        new.sorted_reference_hashes().into(),
    );
    compare("scopes", scope_view(old), scope_view(new));
    compare("lifecycle", lifecycle_view(old), lifecycle_view(new));
    changes
}

fn phrase_text(phrase: &Option<crate::model::obligation::ClausePhrase>) -> Value {
    match phrase {
        Some(phrase) => Value::String(phrase.text.clone()),
        None => Value::Null,
    }
}

fn scope_view(obligation: &ObligationAtom) -> Value {
    let entries: BTreeSet<String> = obligation
        .scopes
        .iter()
        .map(|scope| format!("{}:{}", scope.category.as_str(), scope.normalized))
        .collect();
    entries.into_iter().collect::<Vec<_>>().into()
}

fn lifecycle_view(obligation: &ObligationAtom) -> Value {
    let entries: BTreeSet<String> = obligation
        .lifecycle
        .iter()
        .map(|trigger| format!("{}:{}", trigger.kind.as_str(), trigger.normalized))
        .collect();
    entries.into_iter().collect::<Vec<_>>().into()
}

fn hash_set(obligations: &[ObligationAtom]) -> BTreeSet<String> {
    obligation_identities(obligations)
        .into_iter()
        .map(|identity| identity.identity_hash)
        .collect()
}

/// First obligation per hash wins; later duplicates carry the same
/// canonical fields by construction.
fn by_hash(obligations: &[ObligationAtom]) -> BTreeMap<String, &ObligationAtom> {
    let identities = obligation_identities(obligations);
    let mut map = BTreeMap::new();
    for (identity, obligation) in identities.into_iter().zip(obligations) {
        map.entry(identity.identity_hash).or_insert(obligation);
    }
    map
}

fn sorted_difference(left: &BTreeSet<String>, right: &BTreeSet<String>) -> Vec<String> {
    left.difference(right).cloned().collect()
}

fn sorted_intersection(left: &BTreeSet<String>, right: &BTreeSet<String>) -> Vec<String> {
    left.intersection(right).cloned().collect()
}
