//! Fact envelope input model for activation simulation.
//!
//! # Responsibility
//! - Define the literal fact payload matched against lifecycle cues.
//!
//! # Invariants
//! - Envelope version is checked once at the simulator boundary, never
//!   deep in the pipeline.

use serde::{Deserialize, Serialize};

/// The envelope version this engine accepts.
pub const SUPPORTED_FACT_ENVELOPE_VERSION: u32 = 1;

/// One literal fact supplied by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Matching key, compared literally against trigger text.
    pub key: String,
    pub value: String,
    /// Optional timestamp the fact held at.
    #[serde(default)]
    pub at: Option<String>,
    /// Optional provenance label.
    #[serde(default)]
    pub source: Option<String>,
}

impl Fact {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            at: None,
            source: None,
        }
    }
}

/// Versioned container of facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactEnvelope {
    pub version: u32,
    #[serde(default)]
    pub issued_at: Option<String>,
    pub facts: Vec<Fact>,
}

impl FactEnvelope {
    /// Creates a current-version envelope.
    pub fn new(facts: Vec<Fact>) -> Self {
        Self {
            version: SUPPORTED_FACT_ENVELOPE_VERSION,
            issued_at: None,
            facts,
        }
    }
}
