//! Query orchestrator: turns a question into a grounded answer.
//!
//! Each call moves through `Validating` and then either `Rejected` (blank
//! query, no outbound traffic) or `Processing`, ending in `Done`. Nothing is
//! retried and no partial result is kept.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::Instrument;
use uuid::Uuid;

use super::index::{ScoredPassage, VectorIndex};
use super::prompt::assemble;
use super::store::DocumentStore;
use crate::core::errors::ApiError;
use crate::llm::{EmbeddingProvider, LanguageModel};

/// Shown instead of an answer when the query is blank.
pub const INVALID_QUERY_MESSAGE: &str = "Please enter a valid query.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Passages handed to the model per question.
    pub top_k: usize,
    /// Build the passage index once and keep it for later queries.
    pub reuse_index: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            top_k: crate::core::config::defaults::DEFAULT_TOP_K,
            reuse_index: false,
        }
    }
}

/// Generated text plus the passages it was conditioned on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub context: Vec<ScoredPassage>,
}

impl Answer {
    pub fn rejected() -> Self {
        Self {
            text: INVALID_QUERY_MESSAGE.to_string(),
            context: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct QueryOrchestrator {
    store: DocumentStore,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Arc<dyn LanguageModel>,
    config: OrchestratorConfig,
    cached_index: Arc<OnceCell<VectorIndex>>,
}

impl QueryOrchestrator {
    pub fn new(
        store: DocumentStore,
        embedder: Arc<dyn EmbeddingProvider>,
        model: Arc<dyn LanguageModel>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            model,
            config,
            cached_index: Arc::new(OnceCell::new()),
        }
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn config(&self) -> OrchestratorConfig {
        self.config
    }

    /// Answer text only; blank queries yield [`INVALID_QUERY_MESSAGE`].
    pub async fn answer_query(&self, query: &str) -> Result<String, ApiError> {
        Ok(self.answer(query).await?.text)
    }

    pub async fn answer(&self, query: &str) -> Result<Answer, ApiError> {
        let question = match validate_query(query) {
            Ok(question) => question,
            Err(err) => {
                tracing::info!("Rejected query: {}", err);
                return Ok(Answer::rejected());
            }
        };

        let query_id = Uuid::new_v4();
        let span = tracing::info_span!("answer_query", %query_id, provider = self.model.name());
        async move {
            let context = self.retrieve_validated(question).await?;
            let prompt = assemble(
                &context.iter().map(|hit| hit.passage.clone()).collect::<Vec<_>>(),
                question,
            );
            let text = self.model.generate(&prompt).await?.trim().to_string();
            tracing::info!(
                passages = context.len(),
                answer_chars = text.len(),
                "Query answered"
            );
            Ok(Answer { text, context })
        }
        .instrument(span)
        .await
    }

    /// Top-k passages for `query`, most similar first.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredPassage>, ApiError> {
        let question = validate_query(query)?;
        self.retrieve_validated(question).await
    }

    async fn retrieve_validated(&self, question: &str) -> Result<Vec<ScoredPassage>, ApiError> {
        let query_vector = self.embed_one(question).await?;

        let hits = if self.config.reuse_index {
            let index = self
                .cached_index
                .get_or_try_init(|| self.build_index())
                .await?;
            index.search(&query_vector, self.config.top_k)?
        } else {
            self.build_index()
                .await?
                .search(&query_vector, self.config.top_k)?
        };

        tracing::debug!(
            titles = ?hits.iter().map(|hit| hit.passage.title.as_str()).collect::<Vec<_>>(),
            "Retrieved passages"
        );
        Ok(hits)
    }

    async fn build_index(&self) -> Result<VectorIndex, ApiError> {
        let embeddings = self.embedder.embed(&self.store.texts()).await?;
        let index = VectorIndex::build(self.store.passages(), embeddings)?;
        tracing::debug!(
            passages = index.len(),
            dimension = index.dimension(),
            "Built passage index"
        );
        Ok(index)
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        self.embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Internal("Embedding service returned no vector".to_string()))
    }
}

/// A query is usable when something other than whitespace remains.
pub fn validate_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(INVALID_QUERY_MESSAGE.to_string()));
    }
    Ok(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Bag-of-words hashing embedder; deterministic and offline.
    #[derive(Default)]
    struct HashingEmbedder {
        calls: AtomicUsize,
    }

    const DIM: usize = 64;

    fn hash_word(word: &str) -> usize {
        word.bytes()
            .fold(2166136261u32, |h, b| (h ^ b as u32).wrapping_mul(16777619)) as usize
            % DIM
    }

    #[async_trait]
    impl EmbeddingProvider for HashingEmbedder {
        fn name(&self) -> &str {
            "hashing"
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs
                .iter()
                .map(|text| {
                    let mut v = vec![0.0f32; DIM];
                    for word in text
                        .to_lowercase()
                        .split(|c: char| !c.is_alphanumeric())
                        .filter(|w| !w.is_empty())
                    {
                        v[hash_word(word)] += 1.0;
                    }
                    v
                })
                .collect())
        }
    }

    /// Replies with the context block of the prompt it was given.
    #[derive(Default)]
    struct EchoContextModel {
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl LanguageModel for EchoContextModel {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last_prompt.lock() {
                *last = Some(prompt.to_string());
            }
            let context = prompt
                .split_once("<context>")
                .and_then(|(_, rest)| rest.split_once("</context>"))
                .map(|(context, _)| context)
                .unwrap_or_default();
            Ok(format!("  Based on the context: {}  \n", context.trim()))
        }
    }

    struct FailingModel;

    #[async_trait]
    impl LanguageModel for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, ApiError> {
            Err(ApiError::ServiceUnavailable("model down".to_string()))
        }
    }

    struct Harness {
        embedder: Arc<HashingEmbedder>,
        model: Arc<EchoContextModel>,
        orchestrator: QueryOrchestrator,
    }

    fn harness(config: OrchestratorConfig) -> Harness {
        let embedder = Arc::new(HashingEmbedder::default());
        let model = Arc::new(EchoContextModel::default());
        let orchestrator = QueryOrchestrator::new(
            DocumentStore::builtin(),
            embedder.clone(),
            model.clone(),
            config,
        );
        Harness {
            embedder,
            model,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn blank_queries_are_rejected_without_outbound_calls() {
        let h = harness(OrchestratorConfig::default());

        for query in ["", " ", "\t\n  "] {
            let answer = h.orchestrator.answer_query(query).await.expect("answer");
            assert_eq!(answer, "Please enter a valid query.");
        }

        assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pride_and_prejudice_question_reaches_the_right_passage() {
        let h = harness(OrchestratorConfig::default());

        let answer = h
            .orchestrator
            .answer_query("What is Pride and Prejudice about?")
            .await
            .expect("answer");

        let lower = answer.to_lowercase();
        assert!(lower.contains("man") || lower.contains("fortune"), "{}", answer);
        assert_eq!(answer, answer.trim());
    }

    #[tokio::test]
    async fn non_blank_queries_get_non_empty_answers() {
        let h = harness(OrchestratorConfig::default());

        for query in ["  Who is Paulino?  ", "Frankenstein letter"] {
            let answer = h.orchestrator.answer_query(query).await.expect("answer");
            assert!(!answer.is_empty());
        }
    }

    #[tokio::test]
    async fn prompt_carries_question_and_template() {
        let h = harness(OrchestratorConfig::default());
        h.orchestrator
            .answer_query("Where is Maiva?")
            .await
            .expect("answer");

        let prompt = h
            .model
            .last_prompt
            .lock()
            .expect("lock")
            .clone()
            .expect("prompt recorded");
        assert!(prompt.starts_with(
            "Answer the following question based only on the provided context:"
        ));
        assert!(prompt.ends_with("Question: Where is Maiva?"));
        assert!(prompt.contains("northern Mozambique"));
    }

    #[tokio::test]
    async fn retrieval_is_bounded_ordered_and_from_the_store() {
        let h = harness(OrchestratorConfig {
            top_k: 2,
            reuse_index: false,
        });

        let hits = h
            .orchestrator
            .retrieve("community culture traditions Mozambique")
            .await
            .expect("hits");

        assert!(hits.len() <= 2);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        for hit in &hits {
            assert!(h.orchestrator.store().contains(&hit.passage));
        }
        assert_eq!(hits[0].passage.title, "Maiva Community");
    }

    #[tokio::test]
    async fn same_query_retrieves_same_passages() {
        let h = harness(OrchestratorConfig::default());
        let titles = |hits: Vec<ScoredPassage>| -> Vec<String> {
            hits.into_iter().map(|hit| hit.passage.title).collect()
        };

        let first = titles(h.orchestrator.retrieve("a single man").await.expect("first"));
        let second = titles(h.orchestrator.retrieve("a single man").await.expect("second"));
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn index_is_rebuilt_per_query_by_default() {
        let h = harness(OrchestratorConfig::default());
        h.orchestrator.answer_query("one").await.expect("answer");
        h.orchestrator.answer_query("two").await.expect("answer");

        // corpus + query embedding per call
        assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn reused_index_embeds_corpus_once() {
        let h = harness(OrchestratorConfig {
            top_k: 4,
            reuse_index: true,
        });
        h.orchestrator.answer_query("one").await.expect("answer");
        h.orchestrator.answer_query("two").await.expect("answer");

        assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retrieve_rejects_blank_query() {
        let h = harness(OrchestratorConfig::default());
        assert!(matches!(
            h.orchestrator.retrieve("   ").await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn model_failures_propagate() {
        let orchestrator = QueryOrchestrator::new(
            DocumentStore::builtin(),
            Arc::new(HashingEmbedder::default()),
            Arc::new(FailingModel),
            OrchestratorConfig::default(),
        );

        let err = orchestrator
            .answer_query("What is Pride and Prejudice about?")
            .await
            .expect_err("should propagate");
        assert!(matches!(err, ApiError::ServiceUnavailable(_)));
    }
}
