//! Persistence layer for the logic tree projection.
//!
//! # Responsibility
//! - Define the projection/rehydration contract and its SQLite
//!   implementation.
//! - Keep SQL details and ordering behavior inside the repository
//!   boundary.
//!
//! # Invariants
//! - Projection is idempotent per document (delete-then-insert).
//! - Rehydration rejects malformed persisted trees instead of
//!   repairing them.

pub mod tree_repo;
