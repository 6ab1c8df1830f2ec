use lexatom_core::{
    build_topology, obligation_identities, CrossDocEdgeKind, ObligationAtom, ObligationType,
    TopologyDocument,
};
use std::collections::{BTreeMap, BTreeSet};

fn obligation(
    source_id: &str,
    clause_id: &str,
    modality: &str,
    references: &[&str],
) -> ObligationAtom {
    ObligationAtom {
        obligation_type: ObligationType::Obligation,
        modality: modality.to_string(),
        clause_id: clause_id.to_string(),
        actor: None,
        action: None,
        object: None,
        reference_identities: references.iter().map(|value| value.to_string()).collect(),
        conditions: Vec::new(),
        scopes: Vec::new(),
        lifecycle: Vec::new(),
        span: (0, 8),
        source_id: source_id.to_string(),
    }
}

fn document(
    source_id: &str,
    full_text: &str,
    clauses: &[(&str, &str)],
    obligations: Vec<ObligationAtom>,
) -> TopologyDocument {
    let clause_texts: BTreeMap<String, String> = clauses
        .iter()
        .map(|(clause_id, text)| (clause_id.to_string(), text.to_string()))
        .collect();
    TopologyDocument {
        source_id: source_id.to_string(),
        full_text: full_text.to_string(),
        clause_texts,
        obligations,
    }
}

#[test]
fn conflicts_with_edge_requires_phrase_and_resolved_reference() {
    let citing = obligation("doc-a", "doc-a:c0", "must", &["ref-other-act"]);
    let cited = obligation("doc-b", "doc-b:c0", "shall", &["ref-other-act"]);

    let documents = vec![
        document(
            "doc-a",
            "This duty conflicts with section 2 of the Other Act.",
            &[("doc-a:c0", "This duty conflicts with section 2 of the Other Act.")],
            vec![citing.clone()],
        ),
        document(
            "doc-b",
            "The Other Act imposes its own duty.",
            &[("doc-b:c0", "The Other Act imposes its own duty.")],
            vec![cited.clone()],
        ),
    ];

    let report = build_topology(&documents);
    assert_eq!(report.version, 1);
    assert_eq!(report.edges.len(), 1);

    let edge = &report.edges[0];
    let from_hash = obligation_identities(&[citing])[0].identity_hash.clone();
    let to_hash = obligation_identities(&[cited])[0].identity_hash.clone();
    assert_eq!(edge.kind, CrossDocEdgeKind::ConflictsWith);
    assert_eq!(edge.from, from_hash);
    assert_eq!(edge.to, to_hash);
    assert_eq!(edge.provenance.source_id, "doc-a");
    assert_eq!(edge.provenance.clause_id, "doc-a:c0");
}

#[test]
fn forbidden_phrase_short_circuits_the_whole_document() {
    let citing = obligation("doc-a", "doc-a:c0", "must", &["ref-other-act"]);
    let cited = obligation("doc-b", "doc-b:c0", "shall", &["ref-other-act"]);

    let documents = vec![
        document(
            "doc-a",
            "This duty conflicts with the Other Act and prevails over it.",
            &[(
                "doc-a:c0",
                "This duty conflicts with section 2 of the Other Act.",
            )],
            vec![citing],
        ),
        document(
            "doc-b",
            "The Other Act imposes its own duty.",
            &[("doc-b:c0", "The Other Act imposes its own duty.")],
            vec![cited],
        ),
    ];

    let report = build_topology(&documents);
    assert!(report.edges.is_empty());
    // Nodes are still listed; only edge emission is gated.
    assert_eq!(report.nodes.len(), 2);
}

#[test]
fn no_reference_means_no_edge_even_with_phrase() {
    let citing = obligation("doc-a", "doc-a:c0", "must", &[]);
    let documents = vec![document(
        "doc-a",
        "This duty conflicts with section 2 of the Other Act.",
        &[("doc-a:c0", "This duty conflicts with section 2 of the Other Act.")],
        vec![citing],
    )];

    let report = build_topology(&documents);
    assert!(report.edges.is_empty());
}

#[test]
fn unresolvable_reference_emits_no_edge() {
    let citing = obligation("doc-a", "doc-a:c0", "must", &["ref-nowhere"]);
    let documents = vec![document(
        "doc-a",
        "This duty conflicts with section 2 of the Other Act.",
        &[("doc-a:c0", "This duty conflicts with section 2 of the Other Act.")],
        vec![citing],
    )];

    let report = build_topology(&documents);
    assert!(report.edges.is_empty());
}

#[test]
fn cross_document_target_is_preferred_over_same_document() {
    let citing = obligation("doc-a", "doc-a:c0", "must", &["ref-shared"]);
    let same_doc_target = obligation("doc-a", "doc-a:c1", "shall", &["ref-shared"]);
    let other_doc_target = obligation("doc-b", "doc-b:c0", "may", &["ref-shared"]);

    let documents = vec![
        document(
            "doc-a",
            "The first duty is subject to the shared provision.",
            &[
                ("doc-a:c0", "The first duty is subject to the shared provision."),
                ("doc-a:c1", "A second duty without an edge phrase."),
            ],
            vec![citing.clone(), same_doc_target],
        ),
        document(
            "doc-b",
            "Another duty grounded in the shared provision.",
            &[("doc-b:c0", "Another duty grounded in the shared provision.")],
            vec![other_doc_target.clone()],
        ),
    ];

    let report = build_topology(&documents);
    let to_hash = obligation_identities(&[other_doc_target])[0]
        .identity_hash
        .clone();
    let from_hash = obligation_identities(&[citing])[0].identity_hash.clone();

    let edge = report
        .edges
        .iter()
        .find(|edge| edge.from == from_hash)
        .unwrap();
    assert_eq!(edge.kind, CrossDocEdgeKind::AppliesSubjectTo);
    assert_eq!(edge.to, to_hash);
}

#[test]
fn same_document_fallback_when_no_foreign_target() {
    let citing = obligation("doc-a", "doc-a:c0", "must", &["ref-local"]);
    let local_target = obligation("doc-a", "doc-a:c1", "shall", &["ref-local"]);

    let documents = vec![document(
        "doc-a",
        "The first duty applies despite the saved provision.",
        &[
            ("doc-a:c0", "The first duty applies despite the saved provision."),
            ("doc-a:c1", "The saved provision continues."),
        ],
        vec![citing.clone(), local_target.clone()],
    )];

    let report = build_topology(&documents);
    let from_hash = obligation_identities(&[citing])[0].identity_hash.clone();
    let to_hash = obligation_identities(&[local_target])[0].identity_hash.clone();

    let edge = report
        .edges
        .iter()
        .find(|edge| edge.from == from_hash)
        .unwrap();
    assert_eq!(edge.kind, CrossDocEdgeKind::AppliesDespite);
    assert_eq!(edge.to, to_hash);
}

#[test]
fn nodes_and_edges_are_deterministically_sorted() {
    let citing = obligation("doc-a", "doc-a:c0", "must", &["ref-shared"]);
    let target_b = obligation("doc-b", "doc-b:c0", "shall", &["ref-shared"]);
    let target_c = obligation("doc-c", "doc-c:c0", "may", &["ref-shared"]);

    let documents = vec![
        document(
            "doc-a",
            "The duty supersedes the earlier provision.",
            &[("doc-a:c0", "The duty supersedes the earlier provision.")],
            vec![citing],
        ),
        document("doc-b", "Duty b.", &[("doc-b:c0", "Duty b.")], vec![target_b]),
        document("doc-c", "Duty c.", &[("doc-c:c0", "Duty c.")], vec![target_c]),
    ];

    let first = build_topology(&documents);
    let second = build_topology(&documents);
    assert_eq!(first, second);

    let sorted_nodes = {
        let mut nodes: Vec<String> = BTreeSet::from_iter(first.nodes.iter().cloned())
            .into_iter()
            .collect();
        nodes.sort();
        nodes
    };
    assert_eq!(first.nodes, sorted_nodes);
}
