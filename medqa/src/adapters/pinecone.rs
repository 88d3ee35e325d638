use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::domain::metadata::to_json_object;
use crate::domain::{IndexEntry, IndexStats, Metadata, MetadataValue, ScoredMatch};
use crate::error::{MedQaError, Result};
use crate::ports::{RemoteIndex, VectorStore};

use super::{http_client, send_json};

const API_KEY_HEADER: &str = "Api-Key";
const API_VERSION_HEADER: &str = "X-Pinecone-API-Version";
const API_VERSION: &str = "2024-07";
/// Metadata field holding the passage text.
pub const TEXT_KEY: &str = "text";

#[derive(Debug, Deserialize)]
struct DescribeIndexResponse {
    host: String,
}

#[derive(Debug, Serialize)]
struct Vector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<Vector<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexStatsResponse {
    #[serde(default)]
    total_vector_count: u64,
}

/// Control-plane handle; resolves the index host on [`VectorStore::open`].
pub struct PineconeStore {
    client: reqwest::Client,
    control_plane_url: String,
    index_name: String,
    api_key: String,
}

impl PineconeStore {
    pub fn new(config: &Config, api_key: &str, index_name: &str) -> Result<Self> {
        Ok(Self {
            client: http_client(config.app.request_timeout_secs)?,
            control_plane_url: config
                .vector_store
                .control_plane_url
                .trim_end_matches('/')
                .to_string(),
            index_name: index_name.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    type Index = PineconeIndex;

    async fn open(&self) -> Result<PineconeIndex> {
        let described: DescribeIndexResponse = send_json(
            self.client
                .get(format!("{}/indexes/{}", self.control_plane_url, self.index_name))
                .header(API_KEY_HEADER, &self.api_key)
                .header(API_VERSION_HEADER, API_VERSION),
            MedQaError::VectorStore,
        )
        .await?;
        tracing::debug!(index = %self.index_name, host = %described.host, "resolved index host");

        Ok(PineconeIndex {
            client: self.client.clone(),
            host: with_scheme(&described.host),
            name: self.index_name.clone(),
            api_key: self.api_key.clone(),
        })
    }
}

/// Data-plane handle for one index.
pub struct PineconeIndex {
    client: reqwest::Client,
    host: String,
    name: String,
    api_key: String,
}

impl PineconeIndex {
    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.host))
            .header(API_KEY_HEADER, &self.api_key)
            .header(API_VERSION_HEADER, API_VERSION)
    }
}

#[async_trait]
impl RemoteIndex for PineconeIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(&self, entries: &[IndexEntry]) -> Result<()> {
        let body = UpsertRequest {
            vectors: entries
                .iter()
                .map(|entry| Vector {
                    id: entry.id.as_str(),
                    values: &entry.vector,
                    metadata: stored_metadata(&entry.metadata, &entry.text),
                })
                .collect(),
        };
        let response: UpsertResponse =
            send_json(self.post("/vectors/upsert").json(&body), MedQaError::VectorStore).await?;
        tracing::debug!(upserted = response.upserted_count, "upserted vectors");
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
        };
        let response: QueryResponse =
            send_json(self.post("/query").json(&body), MedQaError::VectorStore).await?;
        Ok(response.matches.into_iter().map(into_scored_match).collect())
    }

    async fn describe(&self) -> Result<IndexStats> {
        let response: IndexStatsResponse = send_json(
            self.post("/describe_index_stats").json(&serde_json::json!({})),
            MedQaError::VectorStore,
        )
        .await?;
        Ok(IndexStats {
            total_count: response.total_vector_count,
            name: self.name.clone(),
        })
    }
}

fn with_scheme(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

fn stored_metadata(metadata: &Metadata, text: &str) -> serde_json::Map<String, serde_json::Value> {
    let mut object = to_json_object(metadata);
    object.insert(TEXT_KEY.to_string(), serde_json::Value::String(text.to_string()));
    object
}

/// Splits the stored text back out of the metadata; non-scalar values are dropped.
fn into_scored_match(hit: QueryMatch) -> ScoredMatch {
    let mut text = String::new();
    let mut metadata = Metadata::new();
    for (key, value) in hit.metadata {
        if key == TEXT_KEY {
            if let serde_json::Value::String(s) = value {
                text = s;
            }
        } else if let Some(value) = MetadataValue::from_json(value) {
            metadata.insert(key, value);
        }
    }
    ScoredMatch {
        text,
        metadata,
        score: hit.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_host_scheme() {
        assert_eq!(with_scheme("medical-abc.svc.pinecone.io"), "https://medical-abc.svc.pinecone.io");
        assert_eq!(with_scheme("http://localhost:5080/"), "http://localhost:5080");
    }

    #[test]
    fn test_text_travels_in_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), "afib.txt".into());
        metadata.insert("chunk_index".to_string(), 2_usize.into());

        let stored = stored_metadata(&metadata, "Atrial fibrillation");
        let hit = QueryMatch {
            score: 0.87,
            metadata: stored,
        };
        let scored = into_scored_match(hit);

        assert_eq!(scored.text, "Atrial fibrillation");
        assert_eq!(scored.metadata, metadata);
        assert!(!scored.metadata.contains_key(TEXT_KEY));
    }

    #[test]
    fn test_query_response_without_matches() {
        let response: QueryResponse = serde_json::from_str(r#"{"namespace":""}"#).unwrap();
        assert!(response.matches.is_empty());
    }
}
