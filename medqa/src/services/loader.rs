use std::path::Path;

use walkdir::WalkDir;

use crate::domain::SourceDocument;
use crate::error::{MedQaError, Result};

pub const SOURCE_KEY: &str = "source";
pub const CONTENT_HASH_KEY: &str = "content_hash";

/// Reads plain-text documents from disk.
#[derive(Debug, Clone)]
pub struct DocumentLoader {
    extensions: Vec<String>,
}

impl DocumentLoader {
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Loads every supported file directly inside `dir`, in file-name order.
    ///
    /// PDFs are reported and skipped; other unknown files are ignored.
    pub fn load_directory(&self, dir: &Path) -> Result<Vec<SourceDocument>> {
        if !dir.is_dir() {
            return Err(MedQaError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("directory not found: {}", dir.display()),
            )));
        }
        tracing::info!("Loading documents from directory: {}", dir.display());

        let mut documents = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| MedQaError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            match self.load_file(path) {
                Ok(doc) => documents.push(doc),
                Err(MedQaError::UnsupportedInput(reason)) if is_pdf(path) => {
                    tracing::warn!("Skipping {}: {reason}", path.display());
                }
                Err(MedQaError::UnsupportedInput(_)) => {
                    tracing::debug!("Ignoring {}", path.display());
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!("Loaded {} documents from directory", documents.len());
        Ok(documents)
    }

    pub fn load_file(&self, path: &Path) -> Result<SourceDocument> {
        let ext = extension(path);
        if ext == "pdf" {
            return Err(MedQaError::UnsupportedInput(
                "PDF parsing is not implemented, please use text files".to_string(),
            ));
        }
        if !self.extensions.contains(&ext) {
            return Err(MedQaError::UnsupportedInput(format!(
                "unsupported file type: {}",
                path.display()
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::InvalidData => {
                MedQaError::Validation(format!("{} is not valid UTF-8", path.display()))
            }
            _ => MedQaError::Io(e),
        })?;
        let doc = SourceDocument::new(text).with_entry(SOURCE_KEY, path.display().to_string());
        let hash = doc.content_hash();
        Ok(doc.with_entry(CONTENT_HASH_KEY, hash))
    }
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn is_pdf(path: &Path) -> bool {
    extension(path) == "pdf"
}
