pub mod chunker;
pub mod ingestion;
pub mod lifecycle;
pub mod loader;
pub mod qa;
pub mod state;
pub mod vector_index;

pub use chunker::TextChunker;
pub use ingestion::{BulkIngestion, IngestionService};
pub use lifecycle::{BootstrapOutcome, BootstrapSettings, Lifecycle, SkipReason, StartupReport};
pub use loader::DocumentLoader;
pub use qa::{QaService, QaSettings};
pub use state::{ReadyCell, ServiceState};
pub use vector_index::VectorIndex;
