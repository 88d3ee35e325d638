use async_trait::async_trait;

use crate::error::Result;

/// Remote text-to-vector capability. Failures surface as `MedQaError::Embedding`.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    /// Embeds a single query text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    /// Embeds document texts; one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    fn model_name(&self) -> &str;
}
