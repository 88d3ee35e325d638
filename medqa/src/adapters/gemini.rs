use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{MedQaError, Result};
use crate::ports::{EmbeddingGenerator, GenerationSettings, TextGenerator};

use super::{http_client, send_json};

const API_KEY_HEADER: &str = "x-goog-api-key";
/// Upper bound the API accepts per `batchEmbedContents` call.
const MAX_BATCH: usize = 100;

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum TaskType {
    RetrievalDocument,
    RetrievalQuery,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

impl<'a> Content<'a> {
    const fn text(text: &'a str) -> Self {
        Self {
            role: None,
            parts: [Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: TaskType,
}

#[derive(Debug, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct Embedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Embedding,
}

#[derive(Debug, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<Embedding>,
}

/// Gemini embedding model behind [`EmbeddingGenerator`].
pub struct GeminiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiEmbedder {
    pub fn new(config: &Config, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: http_client(config.app.request_timeout_secs)?,
            base_url: config.embedding.base_url.trim_end_matches('/').to_string(),
            model: qualified_model(&config.embedding.model),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/{}:{method}", self.base_url, self.model)
    }

    async fn embed_sub_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedRequest {
                    model: &self.model,
                    content: Content::text(text),
                    task_type: TaskType::RetrievalDocument,
                })
                .collect(),
        };
        let response: BatchEmbedResponse = send_json(
            self.client
                .post(self.endpoint("batchEmbedContents"))
                .header(API_KEY_HEADER, &self.api_key)
                .json(&body),
            MedQaError::Embedding,
        )
        .await?;

        if response.embeddings.len() != texts.len() {
            return Err(MedQaError::Embedding(format!(
                "requested {} embeddings, received {}",
                texts.len(),
                response.embeddings.len()
            )));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }
}

#[async_trait]
impl EmbeddingGenerator for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbedRequest {
            model: &self.model,
            content: Content::text(text),
            task_type: TaskType::RetrievalQuery,
        };
        let response: EmbedResponse = send_json(
            self.client
                .post(self.endpoint("embedContent"))
                .header(API_KEY_HEADER, &self.api_key)
                .json(&body),
            MedQaError::Embedding,
        )
        .await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH) {
            vectors.extend(self.embed_sub_batch(batch).await?);
        }
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        Some(text)
    }
}

/// Gemini chat model behind [`TextGenerator`].
pub struct GeminiChat {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiChat {
    pub fn new(config: &Config, api_key: &str) -> Result<Self> {
        Ok(Self {
            client: http_client(config.app.request_timeout_secs)?,
            base_url: config.llm.base_url.trim_end_matches('/').to_string(),
            model: qualified_model(&config.llm.model),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiChat {
    async fn generate(&self, prompt: &str, settings: GenerationSettings) -> Result<String> {
        let body = GenerateRequest {
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: settings.temperature,
            },
        };
        let response: GenerateResponse = send_json(
            self.client
                .post(format!(
                    "{}/v1beta/{}:generateContent",
                    self.base_url, self.model
                ))
                .header(API_KEY_HEADER, &self.api_key)
                .json(&body),
            MedQaError::Generation,
        )
        .await?;

        response
            .into_text()
            .ok_or_else(|| MedQaError::Generation("response contained no candidates".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// The REST API addresses models as `models/<name>`.
fn qualified_model(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_model() {
        assert_eq!(qualified_model("gemini-2.0-flash"), "models/gemini-2.0-flash");
        assert_eq!(qualified_model("models/embedding-001"), "models/embedding-001");
    }

    #[test]
    fn test_batch_request_shape() {
        let body = BatchEmbedRequest {
            requests: vec![EmbedRequest {
                model: "models/embedding-001",
                content: Content::text("stroke"),
                task_type: TaskType::RetrievalDocument,
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["requests"][0]["taskType"], "RETRIEVAL_DOCUMENT");
        assert_eq!(json["requests"][0]["content"]["parts"][0]["text"], "stroke");
        assert!(json["requests"][0]["content"].get("role").is_none());
    }

    #[test]
    fn test_generate_response_text() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"AFib is "},{"text":"an arrhythmia."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_text().as_deref(), Some("AFib is an arrhythmia."));

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.into_text().is_none());
    }
}
