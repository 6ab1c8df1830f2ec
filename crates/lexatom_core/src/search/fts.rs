//! SQLite FTS5-backed phrase search over document text.
//!
//! # Responsibility
//! - Index each document's raw token text once, as a single joined
//!   string.
//! - Resolve phrase hits to token-index spans, snippets, and the set
//!   of covering node ids.
//!
//! # Invariants
//! - The joined string is canonical; token text is never duplicated
//!   per node.
//! - Span location uses a token-equality sliding-window scan over the
//!   joined text; FTS narrows candidate documents only.
//! - Covering nodes use half-open interval overlap:
//!   `node.start < match.end && node.end > match.start`.
//! - Result ordering is deterministic: doc id, then span start.

use crate::db::DbError;
use crate::model::node::{NodeId, TokenSpan};
use crate::model::token::{normalize_token_text, Token};
use log::info;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const SNIPPET_CONTEXT_TOKENS: usize = 3;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for DB interaction and query handling.
#[derive(Debug)]
pub enum SearchError {
    /// Query text cannot be turned into a valid FTS5 expression.
    InvalidQuery { query: String, message: String },
    Db(DbError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery { query, message } => {
                write!(f, "invalid phrase query `{query}`: {message}")
            }
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidQuery { .. } => None,
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Phrase query options.
#[derive(Debug, Clone)]
pub struct PhraseQuery {
    /// Query phrase; matched as consecutive tokens.
    pub text: String,
    /// Maximum number of matches returned across documents.
    pub limit: u32,
}

impl PhraseQuery {
    /// Creates a query with default pagination.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: 20,
        }
    }
}

/// One resolved phrase hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhraseMatch {
    pub doc_id: String,
    /// Token-index span of the matched phrase.
    pub span: TokenSpan,
    pub snippet: String,
    /// Ids of every node whose span overlaps the match, sorted.
    pub node_ids: Vec<NodeId>,
}

/// Indexes one document's token text; idempotent per document.
pub fn index_document(conn: &Connection, doc_id: &str, tokens: &[Token]) -> SearchResult<()> {
    let joined = tokens
        .iter()
        .map(|token| token.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    tx.execute("DELETE FROM doc_text WHERE doc_id = ?1;", [doc_id])?;
    tx.execute("DELETE FROM doc_text_fts WHERE doc_id = ?1;", [doc_id])?;
    tx.execute(
        "INSERT INTO doc_text (doc_id, joined_text) VALUES (?1, ?2);",
        params![doc_id, joined],
    )?;
    tx.execute(
        "INSERT INTO doc_text_fts (doc_id, joined_text) VALUES (?1, ?2);",
        params![doc_id, joined],
    )?;
    tx.commit()?;

    info!(
        "event=doc_index module=search status=ok doc_id={doc_id} tokens={}",
        tokens.len()
    );
    Ok(())
}

/// Searches for a phrase across all indexed documents.
///
/// Returns an empty list for blank queries and when no search index
/// exists; absence of the index is not an error.
pub fn search_phrase(conn: &Connection, query: &PhraseQuery) -> SearchResult<Vec<PhraseMatch>> {
    let trimmed = query.text.trim();
    if trimmed.is_empty() || query.limit == 0 {
        return Ok(Vec::new());
    }
    if !fts_index_exists(conn)? {
        return Ok(Vec::new());
    }

    let query_tokens: Vec<String> = trimmed
        .split_whitespace()
        .map(normalize_token_text)
        .filter(|value| !value.is_empty())
        .collect();
    if query_tokens.is_empty() {
        return Ok(Vec::new());
    }

    let match_expr = phrase_expression(trimmed);
    let mut stmt = conn.prepare(
        "SELECT doc_id
         FROM doc_text_fts
         WHERE doc_text_fts MATCH ?1
         ORDER BY doc_id ASC;",
    )?;
    let mut rows = stmt
        .query([match_expr.as_str()])
        .map_err(|err| map_query_error(err, trimmed))?;
    let mut doc_ids = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|err| map_query_error(err, trimmed))?
    {
        let doc_id: String = row.get(0)?;
        doc_ids.push(doc_id);
    }

    let mut matches = Vec::new();
    'docs: for doc_id in doc_ids {
        let Some(joined) = load_joined_text(conn, &doc_id)? else {
            continue;
        };
        let doc_tokens: Vec<&str> = joined.split_whitespace().collect();
        for span in sliding_window_spans(&doc_tokens, &query_tokens) {
            matches.push(PhraseMatch {
                doc_id: doc_id.clone(),
                span,
                snippet: snippet_around(&doc_tokens, span),
                node_ids: covering_node_ids(conn, &doc_id, span)?,
            });
            if matches.len() as u32 >= query.limit {
                break 'docs;
            }
        }
    }
    Ok(matches)
}

/// Token-equality sliding-window scan; the span-location fallback that
/// is authoritative here since FTS offsets are not exposed.
fn sliding_window_spans(doc_tokens: &[&str], query_tokens: &[String]) -> Vec<TokenSpan> {
    let mut spans = Vec::new();
    if query_tokens.is_empty() || doc_tokens.len() < query_tokens.len() {
        return spans;
    }
    for start in 0..=(doc_tokens.len() - query_tokens.len()) {
        let hit = query_tokens
            .iter()
            .enumerate()
            .all(|(offset, expected)| normalize_token_text(doc_tokens[start + offset]) == *expected);
        if hit {
            spans.push((start, start + query_tokens.len()));
        }
    }
    spans
}

fn snippet_around(doc_tokens: &[&str], span: TokenSpan) -> String {
    let from = span.0.saturating_sub(SNIPPET_CONTEXT_TOKENS);
    let to = (span.1 + SNIPPET_CONTEXT_TOKENS).min(doc_tokens.len());
    doc_tokens[from..to].join(" ")
}

/// All node ids whose half-open span overlaps the match span.
fn covering_node_ids(
    conn: &Connection,
    doc_id: &str,
    span: TokenSpan,
) -> SearchResult<Vec<NodeId>> {
    let mut stmt = conn.prepare(
        "SELECT node_id
         FROM logic_nodes
         WHERE doc_id = ?1
           AND span_i IS NOT NULL
           AND span_i < ?2
           AND span_j > ?3
         ORDER BY node_id ASC;",
    )?;
    let mut rows = stmt.query(params![doc_id, span.1 as i64, span.0 as i64])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get::<_, NodeId>(0)?);
    }
    Ok(ids)
}

fn load_joined_text(conn: &Connection, doc_id: &str) -> SearchResult<Option<String>> {
    use rusqlite::OptionalExtension as _;
    let joined = conn
        .query_row(
            "SELECT joined_text FROM doc_text WHERE doc_id = ?1;",
            [doc_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(joined)
}

/// Quotes the whole query as one FTS5 phrase, doubling inner quotes.
fn phrase_expression(raw: &str) -> String {
    let escaped = raw.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn fts_index_exists(conn: &Connection) -> SearchResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE name = 'doc_text_fts'
        );",
        [],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn map_query_error(err: rusqlite::Error, query: &str) -> SearchError {
    if is_match_syntax_error(&err) {
        return SearchError::InvalidQuery {
            query: query.to_string(),
            message: err.to_string(),
        };
    }
    SearchError::Db(DbError::Sqlite(err))
}

fn is_match_syntax_error(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => {
            let msg = message.to_lowercase();
            (msg.contains("fts5") && msg.contains("syntax"))
                || msg.contains("malformed match expression")
                || msg.contains("unterminated")
        }
        _ => false,
    }
}
