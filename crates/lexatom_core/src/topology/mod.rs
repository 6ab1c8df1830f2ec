//! Phrase-gated cross-document edge inference.
//!
//! # Responsibility
//! - Infer typed edges between obligations of different documents,
//!   gated on an explicit edge phrase and an explicit reference
//!   resolution.
//!
//! # Invariants
//! - A document containing any forbidden reasoning phrase emits zero
//!   edges — a hard short-circuit, not a down-weighting.
//! - No edge exists without both a matching phrase in the clause-local
//!   text and a resolved reference identity.
//! - Output node and edge lists are deterministically sorted.
//! - Edges are created here and never mutated afterward.

use crate::identity::obligation_identities;
use crate::model::obligation::ObligationAtom;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const PAYLOAD_VERSION: u32 = 1;

/// Phrases whose presence anywhere in a document disables edge
/// inference for that document.
pub const FORBIDDEN_PHRASES: &[&str] = &[
    "having regard to",
    "consistent with",
    "as if",
    "taken to",
    "prevails over",
];

/// Edge vocabulary between obligations of different documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossDocEdgeKind {
    Supersedes,
    ConflictsWith,
    ExceptionTo,
    AppliesDespite,
    AppliesSubjectTo,
}

impl CrossDocEdgeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Supersedes => "supersedes",
            Self::ConflictsWith => "conflicts_with",
            Self::ExceptionTo => "exception_to",
            Self::AppliesDespite => "applies_despite",
            Self::AppliesSubjectTo => "applies_subject_to",
        }
    }
}

/// Fixed ordered table of edge-kind phrase patterns; first match in
/// table order decides the kind.
pub const EDGE_PATTERNS: &[(&str, CrossDocEdgeKind)] = &[
    ("supersedes", CrossDocEdgeKind::Supersedes),
    ("repeals and replaces", CrossDocEdgeKind::Supersedes),
    ("conflicts with", CrossDocEdgeKind::ConflictsWith),
    ("is inconsistent with", CrossDocEdgeKind::ConflictsWith),
    ("is an exception to", CrossDocEdgeKind::ExceptionTo),
    ("despite", CrossDocEdgeKind::AppliesDespite),
    ("notwithstanding", CrossDocEdgeKind::AppliesDespite),
    ("subject to", CrossDocEdgeKind::AppliesSubjectTo),
];

/// Clause provenance attached to every emitted edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct EdgeProvenance {
    pub source_id: String,
    pub clause_id: String,
}

/// One immutable cross-document edge between obligation hashes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct CrossDocEdge {
    pub kind: CrossDocEdgeKind,
    pub from: String,
    pub to: String,
    /// The clause-local text slice that carried the edge phrase.
    pub text: String,
    pub provenance: EdgeProvenance,
}

/// Per-document topology input assembled by the caller.
#[derive(Debug, Clone)]
pub struct TopologyDocument {
    pub source_id: String,
    /// Raw full text; scanned for forbidden phrases.
    pub full_text: String,
    /// Clause-local text per clause id; the slice tested for edge
    /// phrases.
    pub clause_texts: BTreeMap<String, String>,
    pub obligations: Vec<ObligationAtom>,
}

/// Topology payload: sorted obligation nodes and sorted edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopologyReport {
    pub version: u32,
    pub nodes: Vec<String>,
    pub edges: Vec<CrossDocEdge>,
}

/// Builds the cross-document topology. Read-only over its inputs;
/// callers serialize this after all per-document projections settle.
pub fn build_topology(documents: &[TopologyDocument]) -> TopologyReport {
    let identities: Vec<Vec<crate::identity::ObligationIdentity>> = documents
        .iter()
        .map(|document| obligation_identities(&document.obligations))
        .collect();

    // reference hash -> obligations (across all documents) carrying it.
    let mut resolution: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
    let mut nodes: BTreeSet<String> = BTreeSet::new();
    for (document, document_identities) in documents.iter().zip(&identities) {
        for (identity, obligation) in document_identities.iter().zip(&document.obligations) {
            nodes.insert(identity.identity_hash.clone());
            for reference_hash in &obligation.reference_identities {
                resolution
                    .entry(reference_hash.clone())
                    .or_default()
                    .push((identity.identity_hash.clone(), document.source_id.clone()));
            }
        }
    }

    let mut edges: BTreeSet<CrossDocEdge> = BTreeSet::new();
    for (document, document_identities) in documents.iter().zip(&identities) {
        if contains_forbidden_phrase(&document.full_text) {
            continue;
        }
        for (identity, obligation) in document_identities.iter().zip(&document.obligations) {
            if obligation.reference_identities.is_empty() {
                continue;
            }
            let Some(clause_text) = document.clause_texts.get(&obligation.clause_id) else {
                continue;
            };
            let Some(kind) = match_edge_kind(clause_text) else {
                continue;
            };
            for reference_hash in &obligation.reference_identities {
                let Some(target) = resolve_target(
                    &resolution,
                    reference_hash,
                    &identity.identity_hash,
                    &document.source_id,
                ) else {
                    continue;
                };
                edges.insert(CrossDocEdge {
                    kind,
                    from: identity.identity_hash.clone(),
                    to: target,
                    text: clause_text.clone(),
                    provenance: EdgeProvenance {
                        source_id: document.source_id.clone(),
                        clause_id: obligation.clause_id.clone(),
                    },
                });
            }
        }
    }

    let mut edges: Vec<CrossDocEdge> = edges.into_iter().collect();
    edges.sort_by(|left, right| {
        (left.kind, &left.from, &left.to, &left.text).cmp(&(
            right.kind,
            &right.from,
            &right.to,
            &right.text,
        ))
    });

    TopologyReport {
        version: PAYLOAD_VERSION,
        nodes: nodes.into_iter().collect(),
        edges,
    }
}

/// Hard short-circuit: any forbidden phrase anywhere in the document.
pub fn contains_forbidden_phrase(full_text: &str) -> bool {
    let lowered = full_text.to_lowercase();
    FORBIDDEN_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

/// First edge pattern (in table order) contained in the clause text.
fn match_edge_kind(clause_text: &str) -> Option<CrossDocEdgeKind> {
    let lowered = clause_text.to_lowercase();
    EDGE_PATTERNS
        .iter()
        .find(|(phrase, _)| lowered.contains(phrase))
        .map(|(_, kind)| *kind)
}

/// Resolves one reference hash to a target obligation: prefer a target
/// from a different source document, else any resolved target. The
/// obligation itself is never a target.
fn resolve_target(
    resolution: &BTreeMap<String, Vec<(String, String)>>,
    reference_hash: &str,
    own_hash: &str,
    own_source: &str,
) -> Option<String> {
    let candidates = resolution.get(reference_hash)?;
    let foreign = candidates
        .iter()
        .find(|(hash, source)| hash != own_hash && source != own_source);
    if let Some((hash, _)) = foreign {
        return Some(hash.clone());
    }
    candidates
        .iter()
        .find(|(hash, _)| hash != own_hash)
        .map(|(hash, _)| hash.clone())
}

#[cfg(test)]
mod tests {
    use super::{contains_forbidden_phrase, match_edge_kind, CrossDocEdgeKind};

    #[test]
    fn forbidden_phrases_are_case_insensitive() {
        assert!(contains_forbidden_phrase("This Act PREVAILS OVER that Act."));
        assert!(contains_forbidden_phrase("having regard to the matter"));
        assert!(!contains_forbidden_phrase("This Act supersedes that Act."));
    }

    #[test]
    fn edge_kind_follows_table_order() {
        assert_eq!(
            match_edge_kind("This provision conflicts with section 2."),
            Some(CrossDocEdgeKind::ConflictsWith)
        );
        assert_eq!(
            match_edge_kind("Applies subject to the approval."),
            Some(CrossDocEdgeKind::AppliesSubjectTo)
        );
        assert_eq!(match_edge_kind("No relation here."), None);
    }
}
