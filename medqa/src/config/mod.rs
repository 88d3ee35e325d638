use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MedQaError, Result};

pub const LOG_LEVELS: [&str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub google_api_key: Option<String>,
    pub pinecone_api_key: Option<String>,
    pub app: AppConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub llm: LlmConfig,
    pub chunking: ChunkingConfig,
    pub ingest: IngestConfig,
    pub qa: QaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub debug: bool,
    pub log_level: String,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Medical Bot API".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            debug: false,
            log_level: "INFO".to_string(),
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "models/embedding-001".to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub index_name: Option<String>,
    pub control_plane_url: String,
    pub upsert_batch_size: usize,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            index_name: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            upsert_batch_size: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            temperature: 0.2,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub data_dir: PathBuf,
    pub max_documents: usize,
    pub skip_document_processing: bool,
    pub extensions: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("../data"),
            max_documents: 1000,
            skip_document_processing: false,
            extensions: vec!["txt".to_string(), "md".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    pub retrieval_k: usize,
    pub source_excerpt_chars: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            retrieval_k: 4,
            source_excerpt_chars: 500,
        }
    }
}

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

impl Config {
    /// Defaults, then the global file, then the project file, then the environment.
    pub fn load() -> Result<Self> {
        let mut merged = toml::Table::new();
        merge_tables(&mut merged, Self::read_table(&Self::global_path())?);
        merge_tables(&mut merged, Self::read_table(Path::new(".medqa/medqa.toml"))?);
        Self::from_table(merged)?
            .with_overrides_from(|key| std::env::var(key).ok())?
            .validated()
    }

    /// Like [`Config::load`] but with an explicit file in place of the global/project pair.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MedQaError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::from_table(Self::read_table(path)?)?
            .with_overrides_from(|key| std::env::var(key).ok())?
            .validated()
    }

    fn global_path() -> PathBuf {
        let config_dir = directories::ProjectDirs::from("", "", "medqa").map_or_else(
            || PathBuf::from("~/.config/medqa"),
            |d| d.config_dir().to_path_buf(),
        );
        config_dir.join("config.toml")
    }

    fn read_table(path: &Path) -> Result<toml::Table> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| {
                MedQaError::Config(format!("{}: {e}", path.display()))
            })
        } else {
            Ok(toml::Table::new())
        }
    }

    fn from_table(table: toml::Table) -> Result<Self> {
        toml::Value::Table(table)
            .try_into()
            .map_err(|e: toml::de::Error| MedQaError::Config(e.to_string()))
    }

    /// Applies environment-style overrides read through `lookup`.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        if let Some(key) = lookup("GOOGLE_API_KEY") {
            self.google_api_key = Some(key);
        }
        if let Some(key) = lookup("PINECONE_API_KEY") {
            self.pinecone_api_key = Some(key);
        }
        if let Some(name) = lookup("PINECONE_INDEX_NAME") {
            self.vector_store.index_name = Some(name);
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.app.log_level = level;
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.ingest.data_dir = PathBuf::from(dir);
        }
        if let Some(v) = parse_override(&lookup, "LLM_TEMPERATURE")? {
            self.llm.temperature = v;
        }
        if let Some(v) = parse_override(&lookup, "CHUNK_SIZE")? {
            self.chunking.chunk_size = v;
        }
        if let Some(v) = parse_override(&lookup, "CHUNK_OVERLAP")? {
            self.chunking.chunk_overlap = v;
        }
        if let Some(v) = parse_override(&lookup, "MAX_DOCUMENTS")? {
            self.ingest.max_documents = v;
        }
        if let Some(v) = lookup("SKIP_DOCUMENT_PROCESSING") {
            self.ingest.skip_document_processing = parse_bool("SKIP_DOCUMENT_PROCESSING", &v)?;
        }
        if let Some(v) = lookup("DEBUG") {
            self.app.debug = parse_bool("DEBUG", &v)?;
        }
        Ok(self)
    }

    pub fn validated(mut self) -> Result<Self> {
        self.app.log_level = self.app.log_level.to_uppercase();
        if !LOG_LEVELS.contains(&self.app.log_level.as_str()) {
            return Err(MedQaError::Config(format!(
                "log_level must be one of {LOG_LEVELS:?}, got {}",
                self.app.log_level
            )));
        }

        check_range("chunk_size", self.chunking.chunk_size, 100, 4000)?;
        check_range("chunk_overlap", self.chunking.chunk_overlap, 0, 500)?;
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(MedQaError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        if self.ingest.max_documents == 0 {
            return Err(MedQaError::Config("max_documents must be >= 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.llm.temperature) {
            return Err(MedQaError::Config(format!(
                "llm temperature must be in [0.0, 1.0], got {}",
                self.llm.temperature
            )));
        }
        if self.qa.retrieval_k == 0 {
            return Err(MedQaError::Config("qa.retrieval_k must be >= 1".to_string()));
        }
        if self.qa.source_excerpt_chars == 0 {
            return Err(MedQaError::Config(
                "qa.source_excerpt_chars must be >= 1".to_string(),
            ));
        }
        if self.vector_store.upsert_batch_size == 0 {
            return Err(MedQaError::Config(
                "vector_store.upsert_batch_size must be >= 1".to_string(),
            ));
        }

        Ok(self)
    }

    /// Credentials the remote providers need; checked when the live context is built.
    pub fn require_credentials(&self) -> Result<Credentials<'_>> {
        let google = non_empty(self.google_api_key.as_deref())
            .ok_or_else(|| MedQaError::Config("GOOGLE_API_KEY is not set".to_string()))?;
        let pinecone = non_empty(self.pinecone_api_key.as_deref())
            .ok_or_else(|| MedQaError::Config("PINECONE_API_KEY is not set".to_string()))?;
        let index_name = non_empty(self.vector_store.index_name.as_deref())
            .ok_or_else(|| MedQaError::Config("PINECONE_INDEX_NAME is not set".to_string()))?;
        Ok(Credentials {
            google_api_key: google,
            pinecone_api_key: pinecone,
            index_name,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub google_api_key: &'a str,
    pub pinecone_api_key: &'a str,
    pub index_name: &'a str,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

fn parse_override<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| MedQaError::Config(format!("{key}={raw}: {e}")))
        })
        .transpose()
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(MedQaError::Config(format!(
            "{key}={raw}: expected a boolean"
        ))),
    }
}

fn check_range(name: &str, value: usize, min: usize, max: usize) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(MedQaError::Config(format!(
            "{name} must be in [{min}, {max}], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default().validated().unwrap();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.qa.retrieval_k, 4);
        assert_eq!(config.qa.source_excerpt_chars, 500);
        assert_eq!(config.llm.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_overrides_from(lookup_from(&[
                ("GOOGLE_API_KEY", "g-key"),
                ("PINECONE_INDEX_NAME", "medical"),
                ("CHUNK_SIZE", "500"),
                ("CHUNK_OVERLAP", "50"),
                ("LLM_TEMPERATURE", "0.7"),
                ("SKIP_DOCUMENT_PROCESSING", "true"),
                ("LOG_LEVEL", "debug"),
            ]))
            .unwrap()
            .validated()
            .unwrap();

        assert_eq!(config.google_api_key.as_deref(), Some("g-key"));
        assert_eq!(config.vector_store.index_name.as_deref(), Some("medical"));
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.ingest.skip_document_processing);
        assert_eq!(config.app.log_level, "DEBUG");
    }

    #[test]
    fn test_unparsable_override_is_config_error() {
        let err = Config::default()
            .with_overrides_from(lookup_from(&[("CHUNK_SIZE", "big")]))
            .unwrap_err();
        assert!(matches!(err, MedQaError::Config(_)));
    }

    #[test]
    fn test_chunk_size_out_of_range() {
        let mut config = Config::default();
        config.chunking.chunk_size = 99;
        assert!(matches!(config.validated(), Err(MedQaError::Config(_))));

        let mut config = Config::default();
        config.chunking.chunk_size = 4001;
        assert!(matches!(config.validated(), Err(MedQaError::Config(_))));
    }

    #[test]
    fn test_chunk_overlap_out_of_range() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = 501;
        assert!(matches!(config.validated(), Err(MedQaError::Config(_))));
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let mut config = Config::default();
        config.chunking.chunk_size = 200;
        config.chunking.chunk_overlap = 200;
        assert!(matches!(config.validated(), Err(MedQaError::Config(_))));
    }

    #[test]
    fn test_temperature_out_of_range() {
        let mut config = Config::default();
        config.llm.temperature = 1.5;
        assert!(matches!(config.validated(), Err(MedQaError::Config(_))));
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.app.log_level = "verbose".to_string();
        assert!(matches!(config.validated(), Err(MedQaError::Config(_))));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let table: toml::Table = toml::from_str(
            r#"
            [chunking]
            chunk_size = 800

            [vector_store]
            index_name = "medical-bot"
            "#,
        )
        .unwrap();
        let config = Config::from_table(table).unwrap().validated().unwrap();
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.vector_store.index_name.as_deref(), Some("medical-bot"));
        assert_eq!(config.vector_store.upsert_batch_size, 100);
    }

    #[test]
    fn test_project_layer_overrides_global_per_key() {
        let mut base: toml::Table = toml::from_str("[llm]\nmodel = \"a\"\ntemperature = 0.5\n").unwrap();
        let overlay: toml::Table = toml::from_str("[llm]\nmodel = \"b\"\n").unwrap();
        merge_tables(&mut base, overlay);
        let config = Config::from_table(base).unwrap();
        assert_eq!(config.llm.model, "b");
        assert!((config.llm.temperature - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medqa.toml");
        std::fs::write(&path, "[ingest]\nmax_documents = 25\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.ingest.max_documents, 25);
    }

    #[test]
    fn test_missing_credentials() {
        let config = Config::default();
        let err = config.require_credentials().unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }
}
