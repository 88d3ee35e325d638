use serde::{Deserialize, Serialize};

use super::{ChunkId, Metadata, MetadataValue};

pub const CHUNK_ID_KEY: &str = "chunk_id";
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// A bounded excerpt of a source document; the unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub chunk_id: ChunkId,
    pub chunk_index: usize,
    pub text: String,
    pub metadata: Metadata,
}

impl DocumentChunk {
    /// Creates a chunk with a fresh id. The id and index are mirrored into the metadata.
    pub fn new(text: String, chunk_index: usize, mut metadata: Metadata) -> Self {
        let chunk_id = ChunkId::generate();
        metadata.insert(
            CHUNK_ID_KEY.to_string(),
            MetadataValue::Text(chunk_id.to_string()),
        );
        metadata.insert(CHUNK_INDEX_KEY.to_string(), chunk_index.into());
        Self {
            chunk_id,
            chunk_index,
            text,
            metadata,
        }
    }
}
