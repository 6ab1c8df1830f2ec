use lexatom_core::db::open_db_in_memory;
use lexatom_core::{
    search_phrase, DocumentService, ExtractorConfig, PhraseQuery, ReferenceMention,
};
use std::collections::BTreeMap;

#[test]
fn ingest_builds_projects_indexes_and_extracts() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(&conn);

    let tokens = lexatom_core::tokenize_plain(
        "The operator must keep records. The agency reviews them yearly.",
    );
    let mut mentions: BTreeMap<String, Vec<ReferenceMention>> = BTreeMap::new();
    mentions.insert(
        "doc-a:c0".to_string(),
        vec![ReferenceMention {
            identity_hash: "ref-hash-1".to_string(),
            clause_id: "doc-a:c0".to_string(),
            text: "section 2".to_string(),
        }],
    );

    let record = service.ingest_document("doc-a", &tokens, &mentions).unwrap();
    assert_eq!(record.source_id, "doc-a");
    assert_eq!(record.tree.clause_spans().len(), 2);
    assert_eq!(record.obligations.len(), 1);
    assert!(record.obligations[0]
        .reference_identities
        .contains("ref-hash-1"));

    // Projection and index are queryable right after ingest.
    let loaded = service.load_tree("doc-a").unwrap();
    assert_eq!(loaded.node_count(), record.tree.node_count());

    let hits = search_phrase(&conn, &PhraseQuery::new("records")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].doc_id, "doc-a");
}

#[test]
fn reingesting_replaces_prior_document_state() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::new(&conn);
    let mentions = BTreeMap::new();

    let first = lexatom_core::tokenize_plain("The operator must keep records.");
    service.ingest_document("doc-a", &first, &mentions).unwrap();

    let second = lexatom_core::tokenize_plain("The holder must not transfer the permit.");
    let record = service.ingest_document("doc-a", &second, &mentions).unwrap();
    assert_eq!(record.obligations.len(), 1);

    let stale = search_phrase(&conn, &PhraseQuery::new("records")).unwrap();
    assert!(stale.is_empty());

    let loaded = service.load_tree("doc-a").unwrap();
    assert_eq!(loaded.node_count(), record.tree.node_count());
}

#[test]
fn extractor_config_flows_through_the_facade() {
    let conn = open_db_in_memory().unwrap();
    let service = DocumentService::with_config(
        &conn,
        ExtractorConfig {
            enable_actor_binding: false,
            enable_action_binding: true,
        },
    );

    let tokens = lexatom_core::tokenize_plain("The operator must keep records.");
    let record = service
        .ingest_document("doc-a", &tokens, &BTreeMap::new())
        .unwrap();
    assert!(record.obligations[0].actor.is_none());
    assert!(record.obligations[0].action.is_some());
}
