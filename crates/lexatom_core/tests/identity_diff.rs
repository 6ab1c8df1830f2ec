use lexatom_core::{
    align_obligations, build_logic_tree, compute_obligation_identity, diff_obligations,
    extract_obligations, obligation_identities, obligation_record, reference_identity,
    tokenize_plain, ExtractorConfig, ObligationAtom, RuleReference, ScopeAtom, ScopeCategory,
};
use std::collections::BTreeMap;

fn extract(text: &str) -> Vec<ObligationAtom> {
    let tokens = tokenize_plain(text);
    let tree = build_logic_tree(&tokens, "doc");
    extract_obligations(&tokens, &tree, &BTreeMap::new(), &ExtractorConfig::default())
}

#[test]
fn identity_is_stable_across_rederivation() {
    let obligations = extract("The operator must keep records.");
    let first = compute_obligation_identity(&obligations[0], 0);
    let second = compute_obligation_identity(&obligations[0], 0);
    assert_eq!(first, second);
    assert_eq!(first.identity_hash.len(), 40);
}

#[test]
fn clause_index_is_carried_but_not_hashed() {
    let obligations = extract("The operator must keep records.");
    let at_zero = compute_obligation_identity(&obligations[0], 0);
    let at_nine = compute_obligation_identity(&obligations[0], 9);
    assert_eq!(at_zero.identity_hash, at_nine.identity_hash);
    assert_eq!(at_nine.clause_index, 9);
}

#[test]
fn scopes_and_lifecycle_are_excluded_from_identity() {
    let obligations = extract("The operator must keep records.");
    let mut scoped = obligations[0].clone();
    scoped.scopes.push(ScopeAtom {
        category: ScopeCategory::Time,
        text: "at all times".to_string(),
        normalized: "at all times".to_string(),
        span: (0, 3),
        clause_id: scoped.clause_id.clone(),
    });

    let plain_hash = compute_obligation_identity(&obligations[0], 0).identity_hash;
    let scoped_hash = compute_obligation_identity(&scoped, 0).identity_hash;
    assert_eq!(plain_hash, scoped_hash);
}

#[test]
fn diff_classifies_added_removed_unchanged() {
    let old = extract("The operator must keep records. The agency may audit files.");
    let new = extract("The operator must keep records. The holder must not transfer the permit.");

    let report = diff_obligations(&old, &new);
    assert_eq!(report.version, 1);
    assert_eq!(report.unchanged.len(), 1);
    assert_eq!(report.added.len(), 1);
    assert_eq!(report.removed.len(), 1);

    let kept = obligation_identities(&old)[0].identity_hash.clone();
    assert_eq!(report.unchanged, vec![kept]);
}

#[test]
fn align_of_identical_sets_is_minimal() {
    let obligations = extract("The operator must keep records. The agency may audit files.");
    let report = align_obligations(&obligations, &obligations);

    assert!(report.added.is_empty());
    assert!(report.removed.is_empty());
    assert!(report.modified.is_empty());
    assert_eq!(report.unchanged.len(), obligations.len());
}

#[test]
fn metadata_drift_reclassifies_as_modified() {
    let old = extract("The operator must keep records.");
    let mut new = old.clone();
    // Same canonical identity fields, drifted descriptive scope set.
    let clause_id = new[0].clause_id.clone();
    new[0].scopes.push(ScopeAtom {
        category: ScopeCategory::Place,
        text: "on the premises".to_string(),
        normalized: "on the premises".to_string(),
        span: (0, 3),
        clause_id,
    });

    let report = align_obligations(&old, &new);
    assert!(report.unchanged.is_empty());
    assert_eq!(report.modified.len(), 1);

    let modified = &report.modified[0];
    assert_eq!(modified.changes.len(), 1);
    assert_eq!(modified.changes[0].field, "scopes");
    assert_eq!(modified.old, obligation_record(&old[0]));
    assert_eq!(modified.new, obligation_record(&new[0]));
}

#[test]
fn obligation_record_shape_is_canonical() {
    let obligations = extract("If notified, the operator must keep records at all times.");
    let record = obligation_record(&obligations[0]);

    assert_eq!(record["type"], "obligation");
    assert_eq!(record["modality"], "must");
    assert_eq!(record["provenance"]["source_id"], "doc");
    assert_eq!(record["provenance"]["clause_id"], "doc:c0");
    assert!(record["reference_identities"].as_array().unwrap().is_empty());
    assert_eq!(record["conditions"][0]["trigger"], "condition");
    assert_eq!(record["scopes"][0]["category"], "time");
}

#[test]
fn reference_identity_noise_invariance() {
    let trimmed = reference_identity(&RuleReference::new("Privacy Act 1988 (Cth)"));
    let noisy = reference_identity(&RuleReference::new("  privacy act 1988 (cth)  "));
    assert_eq!(trimmed.identity_hash, noisy.identity_hash);
    assert_eq!(trimmed.family_key, "privacy act cth");
    assert_eq!(trimmed.year.as_deref(), Some("1988"));
    assert_eq!(trimmed.jurisdiction_hint.as_deref(), Some("cth"));
}

#[test]
fn reference_identity_distinguishes_sections() {
    let base = RuleReference {
        work: "Privacy Act 1988 (Cth)".to_string(),
        section: Some("13G".to_string()),
        pinpoint: None,
    };
    let mut other = base.clone();
    other.section = Some("13H".to_string());

    assert_ne!(
        reference_identity(&base).identity_hash,
        reference_identity(&other).identity_hash
    );
}
