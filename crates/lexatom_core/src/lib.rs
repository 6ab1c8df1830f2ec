//! Deterministic clause structuring and obligation identity engine.
//! This crate is the single source of truth for structural and
//! identity invariants.

pub mod activation;
pub mod db;
pub mod diff;
pub mod extract;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod topology;
pub mod tree;

pub use activation::{simulate_activation, ActivationError, ActivationReason, ActivationReport};
pub use diff::{align_obligations, diff_obligations, AlignmentReport, DiffReport, FieldChange};
pub use extract::{extract_obligations, ExtractorConfig};
pub use identity::{
    compute_obligation_identity, obligation_identities, obligation_record, reference_identity,
    ObligationIdentity,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::fact::{Fact, FactEnvelope};
pub use model::node::{
    ClauseSpan, EdgeType, LogicEdge, LogicNode, LogicTree, NodeId, NodeType, TokenSpan,
};
pub use model::obligation::{
    ClausePhrase, ConditionAtom, ConditionTriggerKind, LifecycleKind, LifecycleTrigger,
    ObligationAtom, ObligationType, ScopeAtom, ScopeCategory,
};
pub use model::reference::{ReferenceIdentity, ReferenceMention, RuleReference};
pub use model::token::{normalize_token_text, tokenize_plain, Token};
pub use repo::tree_repo::{SqliteTreeStore, TreeStore, TreeStoreError, TreeStoreResult};
pub use search::fts::{index_document, search_phrase, PhraseMatch, PhraseQuery, SearchError};
pub use service::document_service::{DocumentRecord, DocumentService, DocumentServiceError};
pub use topology::{
    build_topology, CrossDocEdge, CrossDocEdgeKind, TopologyDocument, TopologyReport,
};
pub use tree::builder::build_logic_tree;
pub use tree::dot::{to_dot, to_dot_with, DotOptions};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
