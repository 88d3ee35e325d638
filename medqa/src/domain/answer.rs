use serde::{Deserialize, Serialize};

use super::{Metadata, ScoredMatch};

pub const ELLIPSIS: &str = "...";
pub const DEFAULT_EXCERPT_CHARS: usize = 500;

/// A passage as shown to the caller: content cut down to an excerpt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub content: String,
    pub metadata: Metadata,
    pub relevance_score: Option<f32>,
}

impl RetrievedPassage {
    pub fn excerpt(text: &str, metadata: Metadata, limit: usize) -> Self {
        Self {
            content: truncate_excerpt(text, limit),
            metadata,
            relevance_score: None,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.relevance_score = Some(score.clamp(0.0, 1.0));
        self
    }
}

/// Keeps at most `limit` chars; longer text is cut and gets [`ELLIPSIS`] appended.
pub fn truncate_excerpt(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{ELLIPSIS}", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Turns matches into display passages, capped at `max_sources`.
pub fn to_passages(
    matches: Vec<ScoredMatch>,
    max_sources: usize,
    excerpt_chars: usize,
    keep_scores: bool,
) -> Vec<RetrievedPassage> {
    matches
        .into_iter()
        .take(max_sources)
        .map(|m| {
            let passage = RetrievedPassage::excerpt(&m.text, m.metadata, excerpt_chars);
            if keep_scores {
                passage.with_score(m.score)
            } else {
                passage
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Option<Vec<RetrievedPassage>>,
    pub original_question: String,
    pub latency_seconds: f64,
    pub model_identifier: String,
}
