use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::defaults::default_config;
use super::paths::AppPaths;
use super::settings::Settings;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 10] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "auth_",
    "access_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 2] = ["max_tokens", "tokens"];

/// Environment variables folded into the configuration tree at startup.
const ENV_OVERRIDES: [(&str, &[&str]); 5] = [
    ("MISTRAL_API_KEY", &["mistral", "api_key"]),
    ("MISTRAL_BASE_URL", &["mistral", "base_url"]),
    ("RAG_HOST", &["server", "host"]),
    ("PORT", &["server", "port"]),
    ("RAG_CORPUS_PATH", &["corpus", "path"]),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
    config_override: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        let config_override = env::var("RAG_CONFIG_PATH").ok().map(PathBuf::from);
        Self {
            paths,
            config_override,
        }
    }

    pub fn with_config_path(paths: Arc<AppPaths>, config_path: Option<PathBuf>) -> Self {
        Self {
            paths,
            config_override: config_path,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.config_override {
            return path.clone();
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Defaults, then `config.yml`, then `secrets.yaml`.
    pub fn load_config(&self) -> Result<Value, ApiError> {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        let merged = deep_merge(&default_config(), &public_config);
        Ok(deep_merge(&merged, &secrets_config))
    }

    /// Resolves typed settings from files and the process environment.
    pub fn load_settings(&self) -> Result<Settings, ApiError> {
        self.load_settings_with(|name| env::var(name).ok())
    }

    pub fn load_settings_with<F>(&self, lookup: F) -> Result<Settings, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.load_config()?;
        apply_env_overrides(&mut config, lookup);
        validate_config(&config)?;

        tracing::debug!(
            "Effective configuration: {}",
            redact_sensitive_values(&config)
        );

        serde_json::from_value(config)
            .map_err(|err| ApiError::Configuration(format!("Invalid config: {}", err)))
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ApiError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|err| {
        ApiError::Configuration(format!("Failed to read {}: {}", path.display(), err))
    })?;
    if contents.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    match serde_yaml::from_str::<Value>(&contents) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(Value::Null) => Ok(Value::Object(Map::new())),
        Ok(_) => Err(ApiError::Configuration(format!(
            "{} must contain a mapping at the top level",
            path.display()
        ))),
        Err(err) => Err(ApiError::Configuration(format!(
            "Failed to parse {}: {}",
            path.display(),
            err
        ))),
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    for (name, path) in ENV_OVERRIDES {
        let Some(raw) = lookup(name) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        let value = if name == "PORT" {
            raw.parse::<u64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string()))
        } else {
            Value::String(raw.to_string())
        };
        ensure_object_path(config, path, value);
    }
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}
