use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
}

/// Remote generative model. Failures surface as `MedQaError::Generation`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, settings: GenerationSettings) -> Result<String>;
    fn model_name(&self) -> &str;
}
