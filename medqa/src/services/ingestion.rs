use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::config::Config;
use crate::domain::{DocumentChunk, IngestReport, Metadata, SourceDocument};
use crate::error::{MedQaError, Result};
use crate::ports::{EmbeddingGenerator, VectorStore};
use crate::services::chunker::TextChunker;
use crate::services::loader::DocumentLoader;
use crate::services::vector_index::VectorIndex;

const ACCEPTED_UPLOAD_TYPES: [&str; 2] = ["text/plain", "text/markdown"];
const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Result of a directory-wide ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkIngestion {
    pub documents_loaded: usize,
    pub chunks_created: usize,
}

pub struct IngestionService<E, S>
where
    E: EmbeddingGenerator,
    S: VectorStore,
{
    index: Arc<VectorIndex<E, S>>,
    chunker: TextChunker,
    loader: DocumentLoader,
    max_documents: usize,
}

impl<E, S> IngestionService<E, S>
where
    E: EmbeddingGenerator,
    S: VectorStore,
{
    pub const fn new(
        index: Arc<VectorIndex<E, S>>,
        chunker: TextChunker,
        loader: DocumentLoader,
        max_documents: usize,
    ) -> Self {
        Self {
            index,
            chunker,
            loader,
            max_documents,
        }
    }

    pub fn from_config(index: Arc<VectorIndex<E, S>>, config: &Config) -> Result<Self> {
        Ok(Self::new(
            index,
            TextChunker::from_config(&config.chunking)?,
            DocumentLoader::new(&config.ingest.extensions),
            config.ingest.max_documents,
        ))
    }

    pub async fn ingest_text(&self, text: &str, metadata: Metadata) -> Result<IngestReport> {
        if text.trim().is_empty() {
            return Err(MedQaError::Validation("text must not be empty".to_string()));
        }
        self.ingest_document(SourceDocument::new(text).with_metadata(metadata))
            .await
    }

    /// Ingests an uploaded file. Only plain text and markdown are accepted.
    pub async fn ingest_upload(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<IngestReport> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        if mime == PDF_CONTENT_TYPE {
            return Err(MedQaError::UnsupportedInput(
                "PDF processing not implemented yet, please upload text files".to_string(),
            ));
        }
        if !ACCEPTED_UPLOAD_TYPES.contains(&mime.as_str()) {
            return Err(MedQaError::Validation(format!(
                "unsupported content type: {content_type}"
            )));
        }

        let text = std::str::from_utf8(bytes)
            .map_err(|e| MedQaError::Validation(format!("{filename} is not valid UTF-8: {e}")))?;
        tracing::info!("Processing uploaded file: {filename}");

        let mut metadata = Metadata::new();
        metadata.insert("filename".to_string(), filename.into());
        metadata.insert("content_type".to_string(), content_type.into());
        metadata.insert("upload_time".to_string(), Utc::now().to_rfc3339().into());
        self.ingest_text(text, metadata).await
    }

    pub async fn ingest_file(&self, path: &Path) -> Result<IngestReport> {
        let document = self.loader.load_file(path)?;
        if document.text.trim().is_empty() {
            return Err(MedQaError::Validation(format!(
                "{} contains no text",
                path.display()
            )));
        }
        self.ingest_document(document).await
    }

    /// Loads every document in `dir`, keeping at most `max_documents` chunks.
    pub async fn ingest_directory(&self, dir: &Path) -> Result<BulkIngestion> {
        let documents = self.loader.load_directory(dir)?;
        if documents.is_empty() {
            return Ok(BulkIngestion::default());
        }

        let mut chunks = self.chunker.split(&documents);
        if chunks.len() > self.max_documents {
            tracing::warn!(
                "Limiting to {} chunks (from {})",
                self.max_documents,
                chunks.len()
            );
            chunks.truncate(self.max_documents);
        }

        let report = self.index.add(&chunks).await?;
        Ok(BulkIngestion {
            documents_loaded: documents.len(),
            chunks_created: report.count,
        })
    }

    async fn ingest_document(&self, document: SourceDocument) -> Result<IngestReport> {
        let started = Instant::now();
        let chunks: Vec<DocumentChunk> = self.chunker.split(std::slice::from_ref(&document));
        let report = self.index.add(&chunks).await?;
        let latency_seconds = started.elapsed().as_secs_f64();

        tracing::info!(
            "Ingested document as {} chunks in {latency_seconds:.2}s",
            report.count
        );
        Ok(IngestReport {
            document_id: report.ids.into_iter().next(),
            chunks_created: report.count,
            latency_seconds,
        })
    }
}
