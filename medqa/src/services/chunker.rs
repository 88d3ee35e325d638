//! Recursive, separator-aware text chunking.
//!
//! Each window holds at most `chunk_size` characters. Within a window the
//! break point is the last occurrence of the highest-priority separator
//! (paragraph break, line break, space); when none fits, the window is cut
//! at exactly `chunk_size`. The next window starts `chunk_overlap`
//! characters before the previous break, so consecutive chunks share exactly
//! that many characters.

use crate::config::ChunkingConfig;
use crate::domain::{DocumentChunk, SourceDocument};
use crate::error::{MedQaError, Result};

/// Separators in priority order. The empty separator means a hard cut.
pub const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(MedQaError::Validation("chunk_size must be > 0".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(MedQaError::Validation(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub const fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits every document; `chunk_index` restarts at zero for each one.
    pub fn split(&self, documents: &[SourceDocument]) -> Vec<DocumentChunk> {
        let chunks: Vec<DocumentChunk> = documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.text)
                    .into_iter()
                    .enumerate()
                    .map(|(index, text)| DocumentChunk::new(text, index, doc.metadata.clone()))
            })
            .collect();

        tracing::debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            "split documents into chunks"
        );
        chunks
    }

    /// Splits one text. A blank text yields no chunks; whitespace-only
    /// windows between real chunks are kept so every boundary overlaps.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every char, plus the end of the string.
        let offsets: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = offsets.len() - 1;

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < total {
            if total - start <= self.chunk_size {
                pieces.push(&text[offsets[start]..]);
                break;
            }
            let end = self.find_break(text, &offsets, start);
            pieces.push(&text[offsets[start]..offsets[end]]);
            start = end - self.chunk_overlap;
        }

        pieces.into_iter().map(str::to_string).collect()
    }

    /// Char index where the window starting at `start` ends.
    ///
    /// The break always lies past `start + chunk_overlap` so the next window
    /// moves forward.
    fn find_break(&self, text: &str, offsets: &[usize], start: usize) -> usize {
        let limit = start + self.chunk_size;
        let window_start = offsets[start];
        let window = &text[window_start..offsets[limit]];

        for separator in SEPARATORS.iter().filter(|s| !s.is_empty()) {
            let found = window.rmatch_indices(separator).find_map(|(pos, sep)| {
                let byte = window_start + pos + sep.len();
                offsets
                    .binary_search(&byte)
                    .ok()
                    .filter(|&idx| idx > start + self.chunk_overlap)
            });
            if let Some(end) = found {
                return end;
            }
        }

        limit
    }
}
