use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::domain::answer::to_passages;
use crate::domain::query::validate_limit;
use crate::domain::{Answer, Query, RetrievedPassage, ScoredMatch, ServiceHealth};
use crate::error::{MedQaError, Result};
use crate::ports::{EmbeddingGenerator, GenerationSettings, TextGenerator, VectorStore};
use crate::services::state::{ReadyCell, ServiceState};
use crate::services::vector_index::{VectorIndex, preview};

/// Question used by the health check.
pub const CANARY_QUESTION: &str = "What is health?";

const PROMPT_PREAMBLE: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

#[derive(Debug, Clone, PartialEq)]
pub struct QaSettings {
    pub model_identifier: String,
    pub temperature: f32,
    pub retrieval_k: usize,
    pub excerpt_chars: usize,
}

impl QaSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model_identifier: config.llm.model.clone(),
            temperature: config.llm.temperature,
            retrieval_k: config.qa.retrieval_k,
            excerpt_chars: config.qa.source_excerpt_chars,
        }
    }
}

/// Generation client and retrieval parameters, fixed once the service is ready.
struct BoundModel<G> {
    generator: Arc<G>,
    generation: GenerationSettings,
    retrieval_k: usize,
}

pub struct QaService<E, S, G>
where
    E: EmbeddingGenerator,
    S: VectorStore,
    G: TextGenerator,
{
    index: Arc<VectorIndex<E, S>>,
    generator: Arc<G>,
    settings: QaSettings,
    bound: ReadyCell<BoundModel<G>>,
}

impl<E, S, G> QaService<E, S, G>
where
    E: EmbeddingGenerator,
    S: VectorStore,
    G: TextGenerator,
{
    pub const fn new(index: Arc<VectorIndex<E, S>>, generator: Arc<G>, settings: QaSettings) -> Self {
        Self {
            index,
            generator,
            settings,
            bound: ReadyCell::new("QA service"),
        }
    }

    /// Initializes the vector index if needed, then binds the model.
    pub async fn initialize(&self) -> Result<()> {
        self.bound
            .get_or_try_init(|| async {
                tracing::info!("Initializing QA service...");
                self.index.initialize().await.inspect_err(|e| {
                    tracing::error!("Failed to initialize QA service: {e}");
                })?;
                tracing::info!(
                    model = %self.settings.model_identifier,
                    generator = self.generator.model_name(),
                    k = self.settings.retrieval_k,
                    "QA service initialized"
                );
                Ok(BoundModel {
                    generator: Arc::clone(&self.generator),
                    generation: GenerationSettings {
                        temperature: self.settings.temperature,
                    },
                    retrieval_k: self.settings.retrieval_k,
                })
            })
            .await?;
        Ok(())
    }

    pub fn state(&self) -> ServiceState {
        self.bound.state()
    }

    pub fn model_identifier(&self) -> &str {
        &self.settings.model_identifier
    }

    pub async fn answer(&self, query: &Query) -> Result<Answer> {
        let bound = self.bound.get()?;
        tracing::info!("Processing query: {}...", preview(query.question()));

        let started = Instant::now();
        let passages = self
            .index
            .retrieve(query.question(), bound.retrieval_k, None)
            .await?;
        let prompt = build_prompt(&passages, query.question());
        let text = bound
            .generator
            .generate(&prompt, bound.generation)
            .await
            .inspect_err(|e| tracing::error!("Failed to process query: {e}"))?;
        let latency_seconds = started.elapsed().as_secs_f64();

        let sources = (query.include_sources() && !passages.is_empty()).then(|| {
            to_passages(
                passages,
                query.max_sources(),
                self.settings.excerpt_chars,
                false,
            )
        });

        tracing::info!("Query processed successfully in {latency_seconds:.2}s");
        Ok(Answer {
            text,
            sources,
            original_question: query.question().to_string(),
            latency_seconds,
            model_identifier: self.settings.model_identifier.clone(),
        })
    }

    /// Retrieval without generation. `k` must be in `1..=10`.
    ///
    /// Passages carry relevance scores only when a threshold was applied.
    pub async fn find_similar(
        &self,
        question: &str,
        k: usize,
        score_threshold: Option<f32>,
    ) -> Result<Vec<RetrievedPassage>> {
        self.bound.get()?;
        let k = validate_limit("limit", k)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(MedQaError::Validation("question must not be empty".to_string()));
        }
        tracing::debug!("Finding similar documents for: {}...", preview(question));

        let matches = self.index.retrieve(question, k, score_threshold).await?;
        let passages = to_passages(
            matches,
            k,
            self.settings.excerpt_chars,
            score_threshold.is_some(),
        );

        tracing::debug!("Found {} similar documents", passages.len());
        Ok(passages)
    }

    /// Probes retrieval with [`CANARY_QUESTION`]; never fails.
    pub async fn health(&self) -> ServiceHealth {
        if !self.bound.is_ready() {
            return ServiceHealth::not_initialized();
        }

        let started = Instant::now();
        match self.index.retrieve(CANARY_QUESTION, 1, None).await {
            Ok(matches) => ServiceHealth::healthy()
                .with_detail("model", &self.settings.model_identifier)
                .with_detail(
                    "response_time",
                    format!("{:.2}s", started.elapsed().as_secs_f64()),
                )
                .with_detail(
                    "retrieval_working",
                    if matches.is_empty() { "no" } else { "yes" },
                ),
            Err(e) => {
                tracing::error!("QA service health check failed: {e}");
                ServiceHealth::unhealthy(e)
            }
        }
    }
}

/// Stuffs every passage and the question into a single prompt.
pub fn build_prompt(passages: &[ScoredMatch], question: &str) -> String {
    let mut prompt = String::from(PROMPT_PREAMBLE);
    prompt.push_str("\n\n");
    let context: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
    prompt.push_str(&context.join("\n\n"));
    let _ = write!(prompt, "\n\nQuestion: {question}\nHelpful Answer:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Metadata;

    fn passage(text: &str) -> ScoredMatch {
        ScoredMatch {
            text: text.to_string(),
            metadata: Metadata::new(),
            score: 0.9,
        }
    }

    #[test]
    fn test_prompt_stuffs_all_passages_in_order() {
        let prompt = build_prompt(
            &[passage("AFib is an arrhythmia."), passage("Warfarin thins blood.")],
            "What is AFib?",
        );
        let first = prompt.find("AFib is an arrhythmia.").unwrap();
        let second = prompt.find("Warfarin thins blood.").unwrap();
        assert!(first < second);
        assert!(prompt.starts_with(PROMPT_PREAMBLE));
        assert!(prompt.ends_with("Question: What is AFib?\nHelpful Answer:"));
    }

    #[test]
    fn test_prompt_without_passages_still_asks() {
        let prompt = build_prompt(&[], "Anything?");
        assert!(prompt.contains("Question: Anything?"));
    }

    #[test]
    fn test_settings_from_config() {
        let settings = QaSettings::from_config(&Config::default());
        assert_eq!(settings.retrieval_k, 4);
        assert_eq!(settings.excerpt_chars, 500);
        assert_eq!(settings.model_identifier, "gemini-2.0-flash");
    }
}
