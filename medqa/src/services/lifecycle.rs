use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;

use crate::error::Result;
use crate::ports::{EmbeddingGenerator, TextGenerator, VectorStore};
use crate::services::ingestion::IngestionService;
use crate::services::qa::QaService;
use crate::services::vector_index::VectorIndex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Disabled,
    IndexPopulated { total_count: u64 },
}

/// What the startup ingestion pass did. It never fails the boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BootstrapOutcome {
    Skipped(SkipReason),
    NoDocuments,
    Ingested {
        documents_loaded: usize,
        chunks_created: usize,
    },
    Failed {
        warning: String,
    },
}

impl fmt::Display for BootstrapOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(SkipReason::Disabled) => {
                f.write_str("skipped (document processing disabled)")
            }
            Self::Skipped(SkipReason::IndexPopulated { total_count }) => {
                write!(f, "skipped (index already holds {total_count} vectors)")
            }
            Self::NoDocuments => f.write_str("no documents found"),
            Self::Ingested {
                documents_loaded,
                chunks_created,
            } => write!(
                f,
                "ingested {documents_loaded} documents as {chunks_created} chunks"
            ),
            Self::Failed { warning } => write!(f, "failed: {warning}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartupReport {
    pub bootstrap: BootstrapOutcome,
}

#[derive(Debug, Clone)]
pub struct BootstrapSettings {
    pub skip_document_processing: bool,
    pub data_dir: PathBuf,
}

/// Brings the services up in order, then seeds an empty index from disk.
pub struct Lifecycle<E, S, G>
where
    E: EmbeddingGenerator,
    S: VectorStore,
    G: TextGenerator,
{
    index: Arc<VectorIndex<E, S>>,
    qa: Arc<QaService<E, S, G>>,
    ingestion: Arc<IngestionService<E, S>>,
    settings: BootstrapSettings,
    report: OnceCell<StartupReport>,
}

impl<E, S, G> Lifecycle<E, S, G>
where
    E: EmbeddingGenerator,
    S: VectorStore,
    G: TextGenerator,
{
    pub const fn new(
        index: Arc<VectorIndex<E, S>>,
        qa: Arc<QaService<E, S, G>>,
        ingestion: Arc<IngestionService<E, S>>,
        settings: BootstrapSettings,
    ) -> Self {
        Self {
            index,
            qa,
            ingestion,
            settings,
            report: OnceCell::const_new(),
        }
    }

    /// Runs startup once and returns the first report on every later call.
    ///
    /// Initialization errors propagate and leave the next call free to retry;
    /// bootstrap problems are reported in the outcome.
    pub async fn start(&self) -> Result<StartupReport> {
        self.report
            .get_or_try_init(|| self.start_services())
            .await
            .cloned()
    }

    async fn start_services(&self) -> Result<StartupReport> {
        tracing::info!("Starting services...");
        self.index.initialize().await?;
        self.qa.initialize().await?;

        let bootstrap = self.bootstrap().await;
        match &bootstrap {
            BootstrapOutcome::Failed { warning } => {
                tracing::warn!("Document processing failed: {warning}");
            }
            outcome => tracing::info!("Document processing {outcome}"),
        }

        tracing::info!("All services initialized successfully");
        Ok(StartupReport { bootstrap })
    }

    async fn bootstrap(&self) -> BootstrapOutcome {
        if self.settings.skip_document_processing {
            return BootstrapOutcome::Skipped(SkipReason::Disabled);
        }
        if let Some(stats) = self.index.stats().await
            && stats.total_count > 0
        {
            return BootstrapOutcome::Skipped(SkipReason::IndexPopulated {
                total_count: stats.total_count,
            });
        }

        tracing::info!(
            "Processing documents from {}",
            self.settings.data_dir.display()
        );
        match self.ingestion.ingest_directory(&self.settings.data_dir).await {
            Ok(bulk) if bulk.documents_loaded == 0 => BootstrapOutcome::NoDocuments,
            Ok(bulk) => BootstrapOutcome::Ingested {
                documents_loaded: bulk.documents_loaded,
                chunks_created: bulk.chunks_created,
            },
            Err(e) => BootstrapOutcome::Failed {
                warning: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let outcome = BootstrapOutcome::Skipped(SkipReason::IndexPopulated { total_count: 12 });
        assert_eq!(outcome.to_string(), "skipped (index already holds 12 vectors)");
        assert_eq!(BootstrapOutcome::NoDocuments.to_string(), "no documents found");
    }

    #[test]
    fn test_outcome_serializes_tagged() {
        let outcome = BootstrapOutcome::Ingested {
            documents_loaded: 2,
            chunks_created: 9,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "ingested");
        assert_eq!(json["chunks_created"], 9);
    }
}
