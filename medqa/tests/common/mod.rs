#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use medqa::adapters::{MemoryIndex, MemoryStore};
use medqa::domain::{IndexEntry, IndexStats, ScoredMatch};
use medqa::ports::{EmbeddingGenerator, GenerationSettings, RemoteIndex, TextGenerator, VectorStore};
use medqa::{Config, MedQa, MedQaError, Result};

pub const AFIB_TEXT: &str =
    "Atrial fibrillation causes irregular heartbeat. Symptoms include palpitations and fatigue.";

const DIMS: usize = 256;

/// Deterministic bag-of-words embedder: each lowercase token bumps one FNV-hashed bucket.
#[derive(Debug, Clone, Default)]
pub struct HashEmbedder;

impl HashEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) % DIMS as u64;
            vector[bucket as usize] += 1.0;
        }
        vector
    }
}

fn fnv1a(token: &str) -> u64 {
    token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl EmbeddingGenerator for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "hash-embedder"
    }
}

/// Returns a fixed answer and keeps every prompt it was given.
#[derive(Debug, Clone, Default)]
pub struct RecordingGenerator {
    prompts: Arc<Mutex<Vec<String>>>,
}

impl RecordingGenerator {
    pub const ANSWER: &'static str = "Stub answer.";

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str, _settings: GenerationSettings) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(Self::ANSWER.to_string())
    }

    fn model_name(&self) -> &str {
        "recording-generator"
    }
}

/// Wraps a [`MemoryStore`] and fails on demand.
///
/// `outage` can be flipped after startup to make every data-plane call fail.
#[derive(Debug, Clone)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_open: bool,
    upserts_before_failure: Option<usize>,
    outage: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn unreachable() -> Self {
        Self {
            inner: MemoryStore::new("flaky"),
            fail_open: true,
            upserts_before_failure: None,
            outage: Arc::default(),
        }
    }

    pub fn failing_after_upserts(inner: MemoryStore, successful: usize) -> Self {
        Self {
            inner,
            fail_open: false,
            upserts_before_failure: Some(successful),
            outage: Arc::default(),
        }
    }

    /// Healthy until the returned switch is set.
    pub fn with_outage_switch(inner: MemoryStore) -> (Self, Arc<AtomicBool>) {
        let outage = Arc::new(AtomicBool::new(false));
        let store = Self {
            inner,
            fail_open: false,
            upserts_before_failure: None,
            outage: Arc::clone(&outage),
        };
        (store, outage)
    }
}

#[async_trait]
impl VectorStore for FlakyStore {
    type Index = FlakyIndex;

    async fn open(&self) -> Result<FlakyIndex> {
        if self.fail_open {
            return Err(MedQaError::VectorStore("index not found".to_string()));
        }
        Ok(FlakyIndex {
            inner: self.inner.open().await?,
            upserts: AtomicUsize::new(0),
            upserts_before_failure: self.upserts_before_failure,
            outage: Arc::clone(&self.outage),
        })
    }
}

pub struct FlakyIndex {
    inner: MemoryIndex,
    upserts: AtomicUsize,
    upserts_before_failure: Option<usize>,
    outage: Arc<AtomicBool>,
}

impl FlakyIndex {
    fn check_reachable(&self) -> Result<()> {
        if self.outage.load(Ordering::SeqCst) {
            return Err(MedQaError::VectorStore("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteIndex for FlakyIndex {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn upsert(&self, entries: &[IndexEntry]) -> Result<()> {
        self.check_reachable()?;
        let call = self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.upserts_before_failure.is_some_and(|limit| call >= limit) {
            return Err(MedQaError::VectorStore("upsert rejected".to_string()));
        }
        self.inner.upsert(entries).await
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredMatch>> {
        self.check_reachable()?;
        self.inner.query(vector, top_k).await
    }

    async fn describe(&self) -> Result<IndexStats> {
        self.check_reachable()?;
        self.inner.describe().await
    }
}

/// Generator whose every call fails upstream.
#[derive(Debug, Clone, Default)]
pub struct FailingGenerator;

#[async_trait]
impl TextGenerator for FailingGenerator {
    async fn generate(&self, _prompt: &str, _settings: GenerationSettings) -> Result<String> {
        Err(MedQaError::Generation("quota exceeded".to_string()))
    }

    fn model_name(&self) -> &str {
        "failing-generator"
    }
}

/// Embedder that returns one vector fewer than requested for batches.
#[derive(Debug, Clone, Default)]
pub struct ShortBatchEmbedder;

#[async_trait]
impl EmbeddingGenerator for ShortBatchEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(HashEmbedder::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().skip(1).map(|t| HashEmbedder::vector(t)).collect())
    }

    fn model_name(&self) -> &str {
        "short-batch-embedder"
    }
}

/// Started-app config: bootstrap disabled, default chunking.
pub fn quiet_config() -> Config {
    let mut config = Config::default();
    config.ingest.skip_document_processing = true;
    config
}

pub type TestApp = MedQa<HashEmbedder, MemoryStore, RecordingGenerator>;

/// Defaults with bootstrap pointed at `data_dir`.
pub fn test_config(data_dir: &Path) -> Config {
    let mut config = Config::default();
    config.ingest.data_dir = data_dir.to_path_buf();
    config
}

pub fn test_app(config: Config, store: &MemoryStore) -> (TestApp, RecordingGenerator) {
    let generator = RecordingGenerator::default();
    let app = MedQa::new(config, HashEmbedder, store.clone(), generator.clone()).unwrap();
    (app, generator)
}

/// A started app over an empty store with bootstrap disabled.
pub async fn started_app(chunk_size: usize, chunk_overlap: usize) -> (TestApp, RecordingGenerator) {
    let mut config = quiet_config();
    config.chunking.chunk_size = chunk_size;
    config.chunking.chunk_overlap = chunk_overlap;
    let (app, generator) = test_app(config, &MemoryStore::new("medical"));
    app.start().await.unwrap();
    (app, generator)
}
