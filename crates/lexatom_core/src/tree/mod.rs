//! Logic tree construction and export.
//!
//! # Responsibility
//! - Turn an ordered token stream into the deterministic clause tree.
//! - Render the tree as byte-stable DOT text.
//!
//! # Invariants
//! - Building the same token stream twice yields structurally equal
//!   trees and byte-identical DOT output.

pub mod builder;
pub mod dot;
