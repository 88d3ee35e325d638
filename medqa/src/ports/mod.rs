pub mod embed;
pub mod generate;
pub mod store;

pub use embed::EmbeddingGenerator;
pub use generate::{GenerationSettings, TextGenerator};
pub use store::{RemoteIndex, VectorStore};
