//! Logic tree store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Project a `LogicTree` into row storage and reconstruct an
//!   equivalent tree later.
//! - Persist per-parent child order explicitly via `ord`.
//!
//! # Invariants
//! - Projecting a document first deletes any prior rows for it.
//! - `ord` is the position within the parent's deterministically
//!   sorted child list; rehydration is driven by `ord` alone, never a
//!   secondary sort.
//! - Zero or multiple ROOT rows for a document is a structural error.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::node::{
    EdgeType, LogicEdge, LogicNode, LogicTree, NodeId, NodeType, TreeAssemblyError,
};
use log::info;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Result type used by tree store operations.
pub type TreeStoreResult<T> = Result<T, TreeStoreError>;

/// Errors from tree store operations.
#[derive(Debug)]
pub enum TreeStoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// No projected tree exists for the requested document.
    UnknownDocument(String),
    /// Persisted tree violates a structural invariant.
    Structural { doc_id: String, message: String },
    /// Persisted row cannot be converted to a valid read model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for TreeStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UnknownDocument(doc_id) => write!(f, "no projected tree for document `{doc_id}`"),
            Self::Structural { doc_id, message } => {
                write!(f, "structural error in document `{doc_id}`: {message}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted tree data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "tree store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "tree store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "tree store requires column `{column}` in table `{table}`")
            }
        }
    }
}

impl Error for TreeStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for TreeStoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for TreeStoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store interface for tree projection and rehydration.
pub trait TreeStore {
    /// Replaces the projected rows for `doc_id` with this tree.
    fn project_tree(&self, doc_id: &str, tree: &LogicTree) -> TreeStoreResult<()>;
    /// Reconstructs the tree projected under `doc_id`.
    fn rehydrate_tree(&self, doc_id: &str) -> TreeStoreResult<LogicTree>;
    /// Removes all projected rows for `doc_id`.
    fn delete_tree(&self, doc_id: &str) -> TreeStoreResult<()>;
    /// Returns whether any rows are projected under `doc_id`.
    fn has_tree(&self, doc_id: &str) -> TreeStoreResult<bool>;
}

/// SQLite-backed tree store.
#[derive(Debug)]
pub struct SqliteTreeStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTreeStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> TreeStoreResult<Self> {
        ensure_store_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TreeStore for SqliteTreeStore<'_> {
    fn project_tree(&self, doc_id: &str, tree: &LogicTree) -> TreeStoreResult<()> {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        tx.execute("DELETE FROM logic_nodes WHERE doc_id = ?1;", [doc_id])?;
        tx.execute("DELETE FROM logic_edges WHERE doc_id = ?1;", [doc_id])?;

        for node in tree.nodes() {
            tx.execute(
                "INSERT INTO logic_nodes (doc_id, node_id, node_type, span_i, span_j)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    doc_id,
                    node.id,
                    node.node_type.as_str(),
                    node.span.map(|span| span.0 as i64),
                    node.span.map(|span| span.1 as i64),
                ],
            )?;
        }

        let mut edge_count = 0usize;
        for parent_id in tree.preorder() {
            for (ord, edge) in tree.sorted_children(parent_id).iter().enumerate() {
                tx.execute(
                    "INSERT INTO logic_edges (doc_id, parent_id, child_id, edge_type, ord)
                     VALUES (?1, ?2, ?3, ?4, ?5);",
                    params![
                        doc_id,
                        edge.parent_id,
                        edge.child_id,
                        edge.edge_type.as_str(),
                        ord as i64,
                    ],
                )?;
                edge_count += 1;
            }
        }

        tx.commit()?;
        info!(
            "event=tree_project module=repo status=ok doc_id={doc_id} nodes={} edges={edge_count} duration_ms={}",
            tree.node_count(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }

    fn rehydrate_tree(&self, doc_id: &str) -> TreeStoreResult<LogicTree> {
        let started_at = Instant::now();
        let mut stmt = self.conn.prepare(
            "SELECT node_id, node_type, span_i, span_j
             FROM logic_nodes
             WHERE doc_id = ?1
             ORDER BY node_id ASC;",
        )?;
        let mut rows = stmt.query([doc_id])?;
        let mut nodes = Vec::new();
        while let Some(row) = rows.next()? {
            nodes.push(parse_node_row(row, doc_id)?);
        }
        if nodes.is_empty() {
            return Err(TreeStoreError::UnknownDocument(doc_id.to_string()));
        }

        let mut stmt = self.conn.prepare(
            "SELECT parent_id, child_id, edge_type
             FROM logic_edges
             WHERE doc_id = ?1
             ORDER BY parent_id ASC, ord ASC;",
        )?;
        let mut rows = stmt.query([doc_id])?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            edges.push(parse_edge_row(row)?);
        }

        let tree = LogicTree::assemble(doc_id, nodes, edges).map_err(|err| structural(doc_id, err))?;
        info!(
            "event=tree_rehydrate module=repo status=ok doc_id={doc_id} nodes={} duration_ms={}",
            tree.node_count(),
            started_at.elapsed().as_millis()
        );
        Ok(tree)
    }

    fn delete_tree(&self, doc_id: &str) -> TreeStoreResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute("DELETE FROM logic_nodes WHERE doc_id = ?1;", [doc_id])?;
        tx.execute("DELETE FROM logic_edges WHERE doc_id = ?1;", [doc_id])?;
        tx.commit()?;
        Ok(())
    }

    fn has_tree(&self, doc_id: &str) -> TreeStoreResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM logic_nodes WHERE doc_id = ?1);",
            [doc_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

fn structural(doc_id: &str, err: TreeAssemblyError) -> TreeStoreError {
    TreeStoreError::Structural {
        doc_id: doc_id.to_string(),
        message: err.to_string(),
    }
}

fn parse_node_row(row: &Row<'_>, doc_id: &str) -> TreeStoreResult<LogicNode> {
    let node_id: NodeId = row.get(0)?;
    let type_text: String = row.get(1)?;
    let node_type = NodeType::parse(&type_text).ok_or_else(|| {
        TreeStoreError::InvalidData(format!(
            "invalid node type `{type_text}` in logic_nodes.node_type"
        ))
    })?;
    let span_i: Option<i64> = row.get(2)?;
    let span_j: Option<i64> = row.get(3)?;
    let span = match (span_i, span_j) {
        (Some(start), Some(end)) if start >= 0 && end >= start => {
            Some((start as usize, end as usize))
        }
        (None, None) => None,
        _ => {
            return Err(TreeStoreError::InvalidData(format!(
                "invalid span ({span_i:?}, {span_j:?}) for node {node_id}"
            )));
        }
    };
    Ok(LogicNode {
        id: node_id,
        node_type,
        span,
        // Surface text is not part of the projection; clause text is
        // recoverable from doc_text via the span.
        text: None,
        source_id: doc_id.to_string(),
    })
}

fn parse_edge_row(row: &Row<'_>) -> TreeStoreResult<LogicEdge> {
    let parent_id: NodeId = row.get(0)?;
    let child_id: NodeId = row.get(1)?;
    let type_text: String = row.get(2)?;
    let edge_type = EdgeType::parse(&type_text).ok_or_else(|| {
        TreeStoreError::InvalidData(format!(
            "invalid edge type `{type_text}` in logic_edges.edge_type"
        ))
    })?;
    Ok(LogicEdge {
        parent_id,
        child_id,
        edge_type,
    })
}

fn ensure_store_connection_ready(conn: &Connection) -> TreeStoreResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(TreeStoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    const NODE_COLUMNS: &[&str] = &["doc_id", "node_id", "node_type", "span_i", "span_j"];
    const EDGE_COLUMNS: &[&str] = &["doc_id", "parent_id", "child_id", "edge_type", "ord"];

    for (table, columns) in [("logic_nodes", NODE_COLUMNS), ("logic_edges", EDGE_COLUMNS)] {
        if !table_exists(conn, table)? {
            return Err(TreeStoreError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(TreeStoreError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> TreeStoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> TreeStoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
