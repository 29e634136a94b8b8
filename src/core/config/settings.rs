//! Typed view over the merged configuration tree.
//!
//! `Settings` is resolved once at startup and handed to every component
//! explicitly; nothing below `main` reads the process environment.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults::{
    DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_HOST, DEFAULT_MISTRAL_BASE_URL,
    DEFAULT_PORT, DEFAULT_TEMPERATURE, DEFAULT_TOP_K,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub mistral: MistralSettings,
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub corpus: CorpusSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ServerSettings {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MistralSettings {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub chat_model: String,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for MistralSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_MISTRAL_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            request_timeout_secs: None,
        }
    }
}

impl MistralSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

// Hand-written so the credential never reaches a log line.
impl fmt::Debug for MistralSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MistralSettings")
            .field("api_key", &"****")
            .field("base_url", &self.base_url)
            .field("embedding_model", &self.embedding_model)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProviderKind {
    #[default]
    Mistral,
    OpenaiCompatible,
}

/// Selects the generation backend. Embeddings always go through Mistral.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProviderKind,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "****"))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub reuse_index: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            reuse_index: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    pub path: Option<String>,
}
