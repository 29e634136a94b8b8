use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Turns text into vectors. One vector per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// return the provider name (e.g. "mistral")
    fn name(&self) -> &str;

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError>;
}

/// Produces a completion for a fully assembled prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// return the provider name (e.g. "mistral", "openai_compatible")
    fn name(&self) -> &str;

    /// non-streaming; the reply is trimmed of surrounding whitespace
    async fn generate(&self, prompt: &str) -> Result<String, ApiError>;
}
