use serde_json::{Map, Value};
use crate::core::errors::ApiError;

pub fn validate_config(config: &Value) -> Result<(), ApiError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    let mistral = expect_optional_object(root, "mistral")?.ok_or_else(missing_credential)?;
    validate_credential(mistral)?;
    validate_url_field(mistral, "mistral.base_url", "base_url")?;
    validate_optional_string_field(mistral, "mistral.embedding_model", "embedding_model")?;
    validate_optional_string_field(mistral, "mistral.chat_model", "chat_model")?;
    validate_f64_field(mistral, "mistral.temperature", "temperature", 0.0, 2.0)?;
    validate_u64_field(mistral, "mistral.max_tokens", "max_tokens", 1, 1_000_000)?;
    validate_u64_field(
        mistral,
        "mistral.request_timeout_secs",
        "request_timeout_secs",
        1,
        86_400,
    )?;

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_enum_field(llm, "llm.provider", "provider", &["mistral", "openai_compatible"])?;
        validate_url_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.model", "model")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;

        if llm.get("provider").and_then(|v| v.as_str()) == Some("openai_compatible")
            && llm.get("base_url").and_then(|v| v.as_str()).is_none()
        {
            return Err(ApiError::Configuration(
                "Invalid config at 'llm.base_url': required when provider is openai_compatible"
                    .to_string(),
            ));
        }
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, 1_000)?;
        validate_bool_field(retrieval, "retrieval.reuse_index", "reuse_index")?;
    }

    if let Some(corpus) = expect_optional_object(root, "corpus")? {
        validate_optional_string_field(corpus, "corpus.path", "path")?;
    }

    Ok(())
}

fn validate_credential(mistral: &Map<String, Value>) -> Result<(), ApiError> {
    match mistral.get("api_key") {
        Some(Value::String(key)) if !key.trim().is_empty() => Ok(()),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(missing_credential()),
        Some(_) => Err(config_type_error("mistral.api_key", "string")),
    }
}

fn missing_credential() -> ApiError {
    ApiError::Configuration(
        "Please set MISTRAL_API_KEY in your environment or .env file.".to_string(),
    )
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ApiError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(out_of_range(path, min, max));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(out_of_range(path, min, max));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() || value.as_str().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "string"))
}

fn validate_url_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    let text = text.trim();
    if text.starts_with("http://") || text.starts_with("https://") {
        return Ok(());
    }
    Err(ApiError::Configuration(format!(
        "Invalid config at '{}': expected an http(s) URL, got '{}'",
        path, text
    )))
}

fn validate_enum_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    allowed: &[&str],
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if allowed.contains(&text) {
        return Ok(());
    }
    Err(ApiError::Configuration(format!(
        "Invalid config at '{}': expected one of {}",
        path,
        allowed.join(", ")
    )))
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ApiError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ApiError::Configuration(format!(
                "Invalid config at '{}[{}]': value cannot be empty",
                path, index
            )));
        }
    }
    Ok(())
}

fn out_of_range<T: std::fmt::Display>(path: &str, min: T, max: T) -> ApiError {
    ApiError::Configuration(format!(
        "Invalid config at '{}': must be between {} and {}",
        path, min, max
    ))
}

fn config_type_error(path: &str, expected: &str) -> ApiError {
    ApiError::Configuration(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
