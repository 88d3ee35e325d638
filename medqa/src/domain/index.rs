use serde::{Deserialize, Serialize};

use super::{EntryId, Metadata};

/// A persisted `(vector, text, metadata)` tuple in the remote store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: EntryId,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: Metadata,
}

/// A similarity-search hit, before any display truncation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub text: String,
    pub metadata: Metadata,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_count: u64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddReport {
    pub ids: Vec<String>,
    pub count: usize,
}
