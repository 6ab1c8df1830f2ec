//! Domain model for clause structure and normative assertions.
//!
//! # Responsibility
//! - Define canonical data structures used by the structuring pipeline.
//! - Keep one arena-backed tree shape shared by builder, persistence
//!   and export layers.
//!
//! # Invariants
//! - Every identifier in this module is reproducible from content;
//!   nothing here carries randomly generated state.
//! - Extracted atoms are immutable once built; downstream layers read
//!   but never mutate them.

pub mod fact;
pub mod node;
pub mod obligation;
pub mod reference;
pub mod token;
