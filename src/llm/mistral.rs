//! Mistral AI client: `mistral-embed` embeddings and chat completions.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::core::config::settings::MistralSettings;
use crate::core::errors::ApiError;
use super::openai_compat::{build_client, chat_completion, post_json};
use super::provider::{EmbeddingProvider, LanguageModel};
use super::types::{ChatMessage, ChatRequest, EmbeddingResponse};

#[derive(Clone)]
pub struct MistralClient {
    base_url: String,
    api_key: String,
    embedding_model: String,
    chat_model: String,
    temperature: f64,
    max_tokens: Option<u32>,
    client: Client,
}

impl MistralClient {
    pub fn new(settings: &MistralSettings) -> Result<Self, ApiError> {
        if settings.api_key.trim().is_empty() {
            return Err(ApiError::Configuration(
                "Mistral client requires an API key".to_string(),
            ));
        }

        Ok(Self {
            base_url: settings.base_url.trim().trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            embedding_model: settings.embedding_model.clone(),
            chat_model: settings.chat_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            client: build_client(settings.request_timeout())?,
        })
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }
}

#[async_trait]
impl EmbeddingProvider for MistralClient {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.embedding_model,
            "input": inputs,
            "encoding_format": "float",
        });

        tracing::debug!(count = inputs.len(), model = %self.embedding_model, "Requesting embeddings");
        let service = EmbeddingProvider::name(self);
        let payload = post_json(&self.client, &url, Some(&self.api_key), &body, service).await?;
        let response: EmbeddingResponse = serde_json::from_value(payload).map_err(|err| {
            ApiError::Internal(format!("Unexpected Mistral embeddings payload: {}", err))
        })?;

        let mut items = response.data;
        if items.len() != inputs.len() {
            return Err(ApiError::Internal(format!(
                "Mistral returned {} embeddings for {} inputs",
                items.len(),
                inputs.len()
            )));
        }

        // Items normally arrive in order; `index` is authoritative when present.
        items.sort_by_key(|item| item.index.unwrap_or(usize::MAX));
        Ok(items.into_iter().map(|item| item.embedding).collect())
    }
}

#[async_trait]
impl LanguageModel for MistralClient {
    fn name(&self) -> &str {
        "mistral"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_sampling(Some(self.temperature), self.max_tokens);

        tracing::debug!(model = %self.chat_model, prompt_chars = prompt.len(), "Requesting completion");
        chat_completion(
            &self.client,
            &self.base_url,
            Some(&self.api_key),
            &self.chat_model,
            request,
            LanguageModel::name(self),
        )
        .await
    }
}
