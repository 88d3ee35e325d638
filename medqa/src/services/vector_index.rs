use std::sync::Arc;

use crate::domain::{
    AddReport, DocumentChunk, EntryId, IndexEntry, IndexStats, ScoredMatch, ServiceHealth,
};
use crate::error::{MedQaError, Result};
use crate::ports::{EmbeddingGenerator, RemoteIndex, VectorStore};
use crate::services::state::{ReadyCell, ServiceState};

pub struct VectorIndex<E, S>
where
    E: EmbeddingGenerator,
    S: VectorStore,
{
    embedder: Arc<E>,
    store: Arc<S>,
    upsert_batch_size: usize,
    index: ReadyCell<S::Index>,
}

impl<E, S> VectorIndex<E, S>
where
    E: EmbeddingGenerator,
    S: VectorStore,
{
    pub const fn new(embedder: Arc<E>, store: Arc<S>, upsert_batch_size: usize) -> Self {
        Self {
            embedder,
            store,
            upsert_batch_size,
            index: ReadyCell::new("Vector index"),
        }
    }

    /// Opens the remote index. Safe to call repeatedly or concurrently.
    pub async fn initialize(&self) -> Result<()> {
        self.index
            .get_or_try_init(|| async {
                tracing::info!("Initializing vector index...");
                let index = self.store.open().await.inspect_err(|e| {
                    tracing::error!("Failed to initialize vector index: {e}");
                })?;
                tracing::info!(
                    index = index.name(),
                    embedding_model = self.embedder.model_name(),
                    "Vector index initialized"
                );
                Ok(index)
            })
            .await?;
        Ok(())
    }

    pub fn state(&self) -> ServiceState {
        self.index.state()
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_ready()
    }

    pub fn embedding_model(&self) -> &str {
        self.embedder.model_name()
    }

    /// Embeds and upserts `chunks`, returning entry ids in input order.
    ///
    /// Upserts run in sequential batches; a failing batch aborts the rest and
    /// earlier batches stay persisted.
    pub async fn add(&self, chunks: &[DocumentChunk]) -> Result<AddReport> {
        let index = self.index.get()?;
        if chunks.is_empty() {
            return Ok(AddReport::default());
        }
        tracing::info!("Adding {} chunks to vector store...", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await.inspect_err(|e| {
            tracing::error!("Failed to embed chunks: {e}");
        })?;
        if vectors.len() != chunks.len() {
            return Err(MedQaError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                vectors.len()
            )));
        }

        let entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry {
                id: EntryId::generate(),
                vector,
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
            })
            .collect();

        for batch in entries.chunks(self.upsert_batch_size.max(1)) {
            index.upsert(batch).await.inspect_err(|e| {
                tracing::error!("Failed to add documents: {e}");
            })?;
        }

        let ids: Vec<String> = entries.into_iter().map(|e| e.id.to_string()).collect();
        tracing::info!("Successfully added {} chunks", ids.len());
        Ok(AddReport {
            count: ids.len(),
            ids,
        })
    }

    /// Top `k` matches for `query_text`, best first.
    ///
    /// With a `score_threshold`, weaker matches are dropped even if that
    /// leaves fewer than `k`.
    pub async fn retrieve(
        &self,
        query_text: &str,
        k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredMatch>> {
        let index = self.index.get()?;
        if k == 0 {
            return Err(MedQaError::Validation("k must be >= 1".to_string()));
        }
        tracing::debug!("Performing similarity search for: {}", preview(query_text));

        let vector = self.embedder.embed(query_text).await.inspect_err(|e| {
            tracing::error!("Failed to embed query: {e}");
        })?;
        let mut matches = index.query(&vector, k).await.inspect_err(|e| {
            tracing::error!("Similarity search failed: {e}");
        })?;

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(threshold) = score_threshold {
            matches.retain(|m| m.score >= threshold);
        }
        matches.truncate(k);

        tracing::debug!("Found {} relevant documents", matches.len());
        Ok(matches)
    }

    /// `None` when the index is not initialized or cannot be reached.
    pub async fn stats(&self) -> Option<IndexStats> {
        let index = self.index.get().ok()?;
        match index.describe().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::error!("Failed to get index stats: {e}");
                None
            }
        }
    }

    pub async fn health(&self) -> ServiceHealth {
        let Ok(index) = self.index.get() else {
            return ServiceHealth::not_initialized();
        };
        match index.describe().await {
            Ok(stats) => ServiceHealth::healthy()
                .with_detail("total_vectors", stats.total_count)
                .with_detail("index_name", stats.name),
            Err(e) => {
                tracing::error!("Vector store health check failed: {e}");
                ServiceHealth::unhealthy(e)
            }
        }
    }
}

/// First hundred chars, for log lines.
pub(crate) fn preview(text: &str) -> &str {
    text.char_indices()
        .nth(100)
        .map_or(text, |(idx, _)| &text[..idx])
}
