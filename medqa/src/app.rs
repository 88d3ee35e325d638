//! Application context: every service, built once and shared.

use std::path::Path;
use std::sync::Arc;

use crate::adapters::{GeminiChat, GeminiEmbedder, PineconeStore};
use crate::config::Config;
use crate::domain::{
    Answer, IndexStats, IngestReport, Metadata, Query, RetrievedPassage, SystemHealth,
};
use crate::error::Result;
use crate::ports::{EmbeddingGenerator, TextGenerator, VectorStore};
use crate::services::{
    BootstrapSettings, IngestionService, Lifecycle, QaService, QaSettings, ServiceState,
    StartupReport, VectorIndex,
};

/// Context wired to Gemini and Pinecone.
pub type LiveMedQa = MedQa<GeminiEmbedder, PineconeStore, GeminiChat>;

pub struct MedQa<E, S, G>
where
    E: EmbeddingGenerator,
    S: VectorStore,
    G: TextGenerator,
{
    config: Config,
    index: Arc<VectorIndex<E, S>>,
    qa: Arc<QaService<E, S, G>>,
    ingestion: Arc<IngestionService<E, S>>,
    lifecycle: Lifecycle<E, S, G>,
}

impl LiveMedQa {
    pub fn from_config(config: Config) -> Result<Self> {
        let credentials = config.require_credentials()?;
        let embedder = GeminiEmbedder::new(&config, credentials.google_api_key)?;
        let generator = GeminiChat::new(&config, credentials.google_api_key)?;
        let store = PineconeStore::new(&config, credentials.pinecone_api_key, credentials.index_name)?;
        Self::new(config, embedder, store, generator)
    }
}

impl<E, S, G> MedQa<E, S, G>
where
    E: EmbeddingGenerator,
    S: VectorStore,
    G: TextGenerator,
{
    /// Wires the services. Nothing remote is touched until [`MedQa::start`].
    pub fn new(config: Config, embedder: E, store: S, generator: G) -> Result<Self> {
        let index = Arc::new(VectorIndex::new(
            Arc::new(embedder),
            Arc::new(store),
            config.vector_store.upsert_batch_size,
        ));
        let qa = Arc::new(QaService::new(
            Arc::clone(&index),
            Arc::new(generator),
            QaSettings::from_config(&config),
        ));
        let ingestion = Arc::new(IngestionService::from_config(Arc::clone(&index), &config)?);
        let lifecycle = Lifecycle::new(
            Arc::clone(&index),
            Arc::clone(&qa),
            Arc::clone(&ingestion),
            BootstrapSettings {
                skip_document_processing: config.ingest.skip_document_processing,
                data_dir: config.ingest.data_dir.clone(),
            },
        );

        Ok(Self {
            config,
            index,
            qa,
            ingestion,
            lifecycle,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn start(&self) -> Result<StartupReport> {
        self.lifecycle.start().await
    }

    pub fn states(&self) -> (ServiceState, ServiceState) {
        (self.index.state(), self.qa.state())
    }

    pub async fn answer_query(
        &self,
        question: &str,
        include_sources: bool,
        max_sources: usize,
    ) -> Result<Answer> {
        let query = Query::new(question)?
            .with_include_sources(include_sources)
            .with_max_sources(max_sources)?;
        self.qa.answer(&query).await
    }

    pub async fn find_similar(
        &self,
        question: &str,
        limit: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<RetrievedPassage>> {
        self.qa.find_similar(question, limit, score_threshold).await
    }

    pub async fn ingest_text(&self, text: &str, metadata: Metadata) -> Result<IngestReport> {
        self.ingestion.ingest_text(text, metadata).await
    }

    pub async fn ingest_upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<IngestReport> {
        self.ingestion
            .ingest_upload(filename, content_type, bytes)
            .await
    }

    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        self.ingestion.ingest_file(path).await
    }

    pub async fn health(&self) -> SystemHealth {
        let vector_store = self.index.health().await;
        let qa_service = self.qa.health().await;
        SystemHealth::combine(&self.config.app.version, &vector_store, &qa_service)
    }

    pub async fn stats(&self) -> Option<IndexStats> {
        self.index.stats().await
    }
}
