//! Per-document ingestion facade.
//!
//! # Responsibility
//! - Build, project, index and extract for one document in one call.
//! - Propagate storage errors unchanged; never mask them.
//!
//! # Invariants
//! - Ingestion is idempotent per document: re-ingesting replaces the
//!   projection and index rows for the same `source_id`.
//! - The facade adds no semantics of its own; it is pure composition
//!   over the pipeline layers.

use crate::extract::{extract_obligations, ExtractorConfig};
use crate::model::node::LogicTree;
use crate::model::obligation::ObligationAtom;
use crate::model::reference::ReferenceMention;
use crate::model::token::Token;
use crate::repo::tree_repo::{SqliteTreeStore, TreeStore, TreeStoreError};
use crate::search::fts::{index_document, SearchError};
use crate::tree::builder::build_logic_tree;
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for document service operations.
pub type DocumentServiceResult<T> = Result<T, DocumentServiceError>;

/// Errors from document ingestion.
#[derive(Debug)]
pub enum DocumentServiceError {
    Store(TreeStoreError),
    Search(SearchError),
}

impl Display for DocumentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Search(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DocumentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Search(err) => Some(err),
        }
    }
}

impl From<TreeStoreError> for DocumentServiceError {
    fn from(value: TreeStoreError) -> Self {
        Self::Store(value)
    }
}

impl From<SearchError> for DocumentServiceError {
    fn from(value: SearchError) -> Self {
        Self::Search(value)
    }
}

/// The outcome of ingesting one document.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub source_id: String,
    pub tree: LogicTree,
    pub obligations: Vec<ObligationAtom>,
}

/// Use-case facade over build → project → index → extract.
pub struct DocumentService<'conn> {
    conn: &'conn Connection,
    config: ExtractorConfig,
}

impl<'conn> DocumentService<'conn> {
    /// Creates a service with default extraction config.
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            config: ExtractorConfig::default(),
        }
    }

    /// Creates a service with explicit extraction config.
    pub fn with_config(conn: &'conn Connection, config: ExtractorConfig) -> Self {
        Self { conn, config }
    }

    /// Ingests one document: builds the tree, replaces its projection
    /// and text index, and extracts obligations.
    pub fn ingest_document(
        &self,
        source_id: &str,
        tokens: &[Token],
        mentions: &BTreeMap<String, Vec<ReferenceMention>>,
    ) -> DocumentServiceResult<DocumentRecord> {
        let tree = build_logic_tree(tokens, source_id);

        let store = SqliteTreeStore::try_new(self.conn)?;
        store.project_tree(source_id, &tree)?;
        index_document(self.conn, source_id, tokens)?;

        let obligations = extract_obligations(tokens, &tree, mentions, &self.config);
        Ok(DocumentRecord {
            source_id: source_id.to_string(),
            tree,
            obligations,
        })
    }

    /// Reconstructs a previously projected tree.
    pub fn load_tree(&self, doc_id: &str) -> DocumentServiceResult<LogicTree> {
        let store = SqliteTreeStore::try_new(self.conn)?;
        Ok(store.rehydrate_tree(doc_id)?)
    }
}
