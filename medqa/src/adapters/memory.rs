use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{IndexEntry, IndexStats, ScoredMatch};
use crate::error::Result;
use crate::ports::{RemoteIndex, VectorStore};

/// In-process store with brute-force cosine search.
///
/// Every index opened from the same store shares its entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    name: String,
    entries: Arc<RwLock<Vec<IndexEntry>>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Arc::default(),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    type Index = MemoryIndex;

    async fn open(&self) -> Result<MemoryIndex> {
        Ok(MemoryIndex {
            name: self.name.clone(),
            entries: Arc::clone(&self.entries),
        })
    }
}

#[derive(Debug, Clone)]
pub struct MemoryIndex {
    name: String,
    entries: Arc<RwLock<Vec<IndexEntry>>>,
}

#[async_trait]
impl RemoteIndex for MemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, entries: &[IndexEntry]) -> Result<()> {
        let mut stored = self.entries.write().await;
        for entry in entries {
            match stored.iter_mut().find(|e| e.id == entry.id) {
                Some(existing) => *existing = entry.clone(),
                None => stored.push(entry.clone()),
            }
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        let stored = self.entries.read().await;
        let mut matches: Vec<ScoredMatch> = stored
            .iter()
            .map(|entry| ScoredMatch {
                text: entry.text.clone(),
                metadata: entry.metadata.clone(),
                score: cosine_similarity(vector, &entry.vector),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn describe(&self) -> Result<IndexStats> {
        let total = self.entries.read().await.len();
        Ok(IndexStats {
            total_count: u64::try_from(total).unwrap_or(u64::MAX),
            name: self.name.clone(),
        })
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
