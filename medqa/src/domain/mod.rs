pub mod answer;
pub mod chunk;
pub mod document;
pub mod health;
pub mod id;
pub mod index;
pub mod metadata;
pub mod query;

pub use answer::{Answer, RetrievedPassage, truncate_excerpt};
pub use chunk::DocumentChunk;
pub use document::{IngestReport, SourceDocument};
pub use health::{HealthStatus, OverallStatus, ServiceHealth, SystemHealth};
pub use id::{ChunkId, EntryId};
pub use index::{AddReport, IndexEntry, IndexStats, ScoredMatch};
pub use metadata::{Metadata, MetadataValue};
pub use query::Query;
