use async_trait::async_trait;

use crate::domain::{IndexEntry, IndexStats, ScoredMatch};
use crate::error::Result;

/// Connection factory for a remote vector store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    type Index: RemoteIndex + 'static;

    /// Resolves and opens the configured index. Called once per process.
    async fn open(&self) -> Result<Self::Index>;
}

/// An opened index. Failures surface as `MedQaError::VectorStore`.
#[async_trait]
pub trait RemoteIndex: Send + Sync {
    fn name(&self) -> &str;
    async fn upsert(&self, entries: &[IndexEntry]) -> Result<()>;
    /// Nearest neighbours by descending score; at most `top_k` matches.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>>;
    async fn describe(&self) -> Result<IndexStats>;
}
