use thiserror::Error;

#[derive(Error, Debug)]
pub enum MedQaError {
    #[error("{0} not initialized, call initialize() first")]
    NotInitialized(&'static str),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Embedding provider error: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MedQaError {
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NotInitialized(_) => 1,
            Self::Validation(_) => 2,
            Self::Config(_) => 3,
            Self::Embedding(_) | Self::VectorStore(_) | Self::Generation(_) => 4,
            Self::UnsupportedInput(_) => 5,
            Self::Io(_) | Self::Serialization(_) => 10,
        }
    }

    /// Whether the failure came from one of the remote capabilities.
    pub const fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Embedding(_) | Self::VectorStore(_) | Self::Generation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, MedQaError>;
