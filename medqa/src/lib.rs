//! Retrieval-augmented question answering over a medical document corpus.
//!
//! [`app::MedQa`] wires an [`ports::EmbeddingGenerator`], a
//! [`ports::VectorStore`] and a [`ports::TextGenerator`] into the indexing,
//! ingestion and QA services. [`app::LiveMedQa`] uses Gemini and Pinecone;
//! tests use [`adapters::MemoryStore`] with stub models.

pub mod adapters;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod ports;
pub mod services;

pub use app::{LiveMedQa, MedQa};
pub use config::Config;
pub use error::{MedQaError, Result};
