//! Implementations of the capability ports.
//!
//! `gemini` and `pinecone` talk to the hosted services over HTTPS; `memory`
//! keeps everything in process for tests and offline runs.

pub mod gemini;
pub mod memory;
pub mod pinecone;

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

use crate::error::{MedQaError, Result};

pub use gemini::{GeminiChat, GeminiEmbedder};
pub use memory::{MemoryIndex, MemoryStore};
pub use pinecone::{PineconeIndex, PineconeStore};

pub(crate) fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| MedQaError::Config(format!("failed to build HTTP client: {e}")))
}

/// Sends `request` and decodes a JSON body. Transport failures, non-2xx
/// statuses and undecodable bodies are all wrapped with `wrap`.
pub(crate) async fn send_json<T>(request: RequestBuilder, wrap: fn(String) -> MedQaError) -> Result<T>
where
    T: DeserializeOwned,
{
    let response = request.send().await.map_err(|e| wrap(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(wrap(format!("HTTP {status}: {body}")));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| wrap(format!("invalid response body: {e}")))
}
