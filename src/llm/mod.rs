pub mod mistral;
pub mod openai_compat;
pub mod provider;
pub mod types;

use std::sync::Arc;

use crate::core::config::{LlmProviderKind, Settings};
use crate::core::errors::ApiError;

pub use mistral::MistralClient;
pub use openai_compat::OpenAiCompatibleModel;
pub use provider::{EmbeddingProvider, LanguageModel};
pub use types::{ChatMessage, ChatRequest};

/// Picks the generation backend named by `llm.provider`.
pub fn build_language_model(
    settings: &Settings,
    mistral: &MistralClient,
) -> Result<Arc<dyn LanguageModel>, ApiError> {
    match settings.llm.provider {
        LlmProviderKind::Mistral => Ok(Arc::new(mistral.clone())),
        LlmProviderKind::OpenaiCompatible => {
            let base_url = settings.llm.base_url.clone().ok_or_else(|| {
                ApiError::Configuration(
                    "llm.base_url is required for the openai_compatible provider".to_string(),
                )
            })?;
            let model = settings
                .llm
                .model
                .clone()
                .unwrap_or_else(|| mistral.chat_model().to_string());
            let generator = OpenAiCompatibleModel::new(
                base_url,
                model,
                settings.llm.api_key.clone(),
                settings.mistral.request_timeout(),
            )?
            .with_sampling(Some(settings.mistral.temperature), settings.mistral.max_tokens);
            Ok(Arc::new(generator))
        }
    }
}
