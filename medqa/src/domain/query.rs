use serde::{Deserialize, Serialize};

use crate::error::{MedQaError, Result};

pub const MAX_QUESTION_CHARS: usize = 1000;
pub const MAX_SOURCES_LIMIT: usize = 10;
pub const DEFAULT_MAX_SOURCES: usize = 3;

/// A validated question-answering request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuery")]
pub struct Query {
    question: String,
    include_sources: bool,
    max_sources: usize,
}

impl Query {
    pub fn new(question: impl AsRef<str>) -> Result<Self> {
        let question = question.as_ref().trim();
        let len = question.chars().count();
        if len == 0 {
            return Err(MedQaError::Validation("question must not be empty".to_string()));
        }
        if len > MAX_QUESTION_CHARS {
            return Err(MedQaError::Validation(format!(
                "question must be at most {MAX_QUESTION_CHARS} characters, got {len}"
            )));
        }
        Ok(Self {
            question: question.to_string(),
            include_sources: true,
            max_sources: DEFAULT_MAX_SOURCES,
        })
    }

    #[must_use]
    pub const fn with_include_sources(mut self, include_sources: bool) -> Self {
        self.include_sources = include_sources;
        self
    }

    pub fn with_max_sources(mut self, max_sources: usize) -> Result<Self> {
        self.max_sources = validate_limit("max_sources", max_sources)?;
        Ok(self)
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub const fn include_sources(&self) -> bool {
        self.include_sources
    }

    pub const fn max_sources(&self) -> usize {
        self.max_sources
    }
}

/// Checks a source or result limit against `1..=10`.
pub fn validate_limit(name: &str, limit: usize) -> Result<usize> {
    if (1..=MAX_SOURCES_LIMIT).contains(&limit) {
        Ok(limit)
    } else {
        Err(MedQaError::Validation(format!(
            "{name} must be between 1 and {MAX_SOURCES_LIMIT}, got {limit}"
        )))
    }
}

#[derive(Deserialize)]
struct RawQuery {
    question: String,
    #[serde(default = "default_include_sources")]
    include_sources: bool,
    #[serde(default = "default_max_sources")]
    max_sources: usize,
}

const fn default_include_sources() -> bool {
    true
}

const fn default_max_sources() -> usize {
    DEFAULT_MAX_SOURCES
}

impl TryFrom<RawQuery> for Query {
    type Error = MedQaError;

    fn try_from(raw: RawQuery) -> Result<Self> {
        Self::new(raw.question)?
            .with_include_sources(raw.include_sources)
            .with_max_sources(raw.max_sources)
    }
}
