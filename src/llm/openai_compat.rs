use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use super::provider::LanguageModel;
use super::types::{ChatMessage, ChatRequest};

/// Generation against any server speaking the OpenAI chat-completions
/// dialect (LM Studio, vLLM, llama.cpp server, ...).
#[derive(Clone)]
pub struct OpenAiCompatibleModel {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
    client: Client,
}

impl OpenAiCompatibleModel {
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            temperature: None,
            max_tokens: None,
            client: build_client(timeout)?,
        })
    }

    pub fn with_sampling(mut self, temperature: Option<f64>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl LanguageModel for OpenAiCompatibleModel {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ApiError> {
        let request = ChatRequest::new(vec![ChatMessage::user(prompt)])
            .with_sampling(self.temperature, self.max_tokens);
        chat_completion(
            &self.client,
            &self.base_url,
            self.api_key.as_deref(),
            &self.model,
            request,
            self.name(),
        )
        .await
    }
}

pub(crate) fn build_client(timeout: Option<Duration>) -> Result<Client, ApiError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(ApiError::internal)
}

/// POSTs a JSON body and returns the decoded JSON reply, mapping failures
/// onto the authentication / availability taxonomy.
pub(crate) async fn post_json(
    client: &Client,
    url: &str,
    api_key: Option<&str>,
    body: &Value,
    service: &str,
) -> Result<Value, ApiError> {
    let mut request = client.post(url).json(body);
    if let Some(key) = api_key {
        request = request.bearer_auth(key);
    }

    let res = request
        .send()
        .await
        .map_err(|err| ApiError::from_transport(service, err))?;

    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(ApiError::from_status(service, status, &text));
    }

    res.json::<Value>()
        .await
        .map_err(|err| ApiError::Internal(format!("{} sent an unreadable reply: {}", service, err)))
}

pub(crate) async fn chat_completion(
    client: &Client,
    base_url: &str,
    api_key: Option<&str>,
    model: &str,
    request: ChatRequest,
    service: &str,
) -> Result<String, ApiError> {
    let url = format!("{}/v1/chat/completions", base_url);

    let mut body = json!({
        "model": model,
        "messages": request.messages,
        "stream": false,
    });

    if let Some(obj) = body.as_object_mut() {
        if let Some(t) = request.temperature { obj.insert("temperature".to_string(), json!(t)); }
        if let Some(t) = request.max_tokens { obj.insert("max_tokens".to_string(), json!(t)); }
    }

    let payload = post_json(client, &url, api_key, &body, service).await?;
    let content = extract_message_content(&payload).ok_or_else(|| {
        ApiError::Internal(format!("{} reply contained no message content", service))
    })?;

    Ok(content.trim().to_string())
}

/// `content` is a plain string for most models; some return a list of
/// typed chunks, of which only the text ones are kept.
fn extract_message_content(payload: &Value) -> Option<String> {
    let content = &payload["choices"][0]["message"]["content"];
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let text: String = parts
                .iter()
                .filter(|part| part["type"].as_str().map_or(true, |kind| kind == "text"))
                .filter_map(|part| part["text"].as_str())
                .collect();
            Some(text)
        }
        _ => None,
    }
}
