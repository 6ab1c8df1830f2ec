//! Document text indexing and phrase search.
//!
//! # Responsibility
//! - Expose the FTS5-backed phrase query that resolves hits back to
//!   covering tree node ids.
//!
//! # Invariants
//! - A missing search index is a recoverable no-results condition.

pub mod fts;
