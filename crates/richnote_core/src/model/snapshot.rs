//! Persisted snapshot envelope.
//!
//! Wire shape: `{ "document": { "key": ..., "nodes": [...] } }`.

use crate::model::document::Document;
use serde::{Deserialize, Serialize};

/// Top-level JSON envelope written to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub document: Document,
}

impl Snapshot {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Serializes to canonical JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parses JSON and validates the document structure.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
