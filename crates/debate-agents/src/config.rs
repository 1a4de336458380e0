//! Runner configuration: inference endpoints, routing, and sampling.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Values in a TOML file passed with `--config`
//! 2. Environment variables (`DEBATE_LOCAL_URL`, `OPENAI_API_KEY`, ...)
//! 3. Built-in defaults (Ollama on localhost)
//!
//! Fields missing from the file fall through to 2 and 3.

use std::env;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_LOCAL_URL: &str = "http://localhost:11434";
const DEFAULT_CLOUD_URL: &str = "https://api.openai.com/v1";
const DEFAULT_CLOUD_MODEL: &str = "gpt-4o-mini-2024-07-18";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

const ENV_LOCAL_URL: &str = "DEBATE_LOCAL_URL";
const ENV_LOCAL_BACKEND: &str = "DEBATE_LOCAL_BACKEND";
const ENV_LOCAL_API_KEY: &str = "DEBATE_LOCAL_API_KEY";
const ENV_CLOUD_URL: &str = "DEBATE_CLOUD_URL";
const ENV_CLOUD_MODELS: &str = "DEBATE_CLOUD_MODELS";
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// Wire protocol spoken by the local inference server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalBackend {
    /// Ollama's native `/api/chat`.
    Ollama,
    /// vLLM / llama.cpp / TGI `/chat/completions`.
    OpenAiCompatible,
}

impl LocalBackend {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "openai_compatible" | "vllm" => Some(Self::OpenAiCompatible),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalEndpoint {
    pub base_url: String,
    pub backend: LocalBackend,
    /// Most local servers accept any value.
    pub api_key: Option<String>,
}

impl Default for LocalEndpoint {
    fn default() -> Self {
        Self {
            base_url: env::var(ENV_LOCAL_URL).unwrap_or_else(|_| DEFAULT_LOCAL_URL.to_string()),
            backend: env::var(ENV_LOCAL_BACKEND)
                .ok()
                .and_then(|v| LocalBackend::from_env_value(&v))
                .unwrap_or(LocalBackend::Ollama),
            api_key: env::var(ENV_LOCAL_API_KEY).ok(),
        }
    }
}

/// Hosted OpenAI-compatible endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudEndpoint {
    pub base_url: String,
    pub api_key: String,
}

impl CloudEndpoint {
    fn from_env() -> Option<Self> {
        let api_key = env::var(ENV_OPENAI_API_KEY).ok()?;
        let base_url = env::var(ENV_CLOUD_URL).unwrap_or_else(|_| DEFAULT_CLOUD_URL.to_string());
        Some(Self { base_url, api_key })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub temperature: f64,
    pub top_p: f64,
    /// Completion budget for cloud requests.
    pub cloud_max_tokens: u32,
    /// New-token budget for local requests.
    pub local_max_tokens: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            cloud_max_tokens: 2048,
            local_max_tokens: 256,
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be in [0, 2], got {}",
                self.temperature
            ));
        }
        if !(self.top_p > 0.0 && self.top_p <= 1.0) {
            return Err(format!("top_p must be in (0, 1], got {}", self.top_p));
        }
        if self.cloud_max_tokens == 0 || self.local_max_tokens == 0 {
            return Err("max token budgets must be > 0".to_string());
        }
        Ok(())
    }
}

/// Top-level runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub local: LocalEndpoint,
    /// `None` when no API key is available.
    pub cloud: Option<CloudEndpoint>,
    /// Model ids served by the cloud endpoint; everything else goes local.
    pub cloud_models: Vec<String>,
    pub sampling: SamplingConfig,
    pub request_timeout_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        let cloud_models = env::var(ENV_CLOUD_MODELS)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_else(|_| vec![DEFAULT_CLOUD_MODEL.to_string()]);

        Self {
            local: LocalEndpoint::default(),
            cloud: CloudEndpoint::from_env(),
            cloud_models,
            sampling: SamplingConfig::default(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RunnerConfig {
    /// Defaults and environment, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                Self::from_toml(&raw)
                    .with_context(|| format!("Failed to parse config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate().map_err(anyhow::Error::msg)?;
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.sampling.validate()?;
        if self.local.base_url.trim().is_empty() {
            return Err("local.base_url must not be empty".to_string());
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let cfg = RunnerConfig::default();
        cfg.validate().expect("default config should be valid");
        assert_eq!(cfg.sampling.cloud_max_tokens, 2048);
        assert_eq!(cfg.sampling.local_max_tokens, 256);
    }

    #[test]
    fn toml_overrides_selected_fields() {
        let cfg = RunnerConfig::from_toml(
            r#"
            cloud_models = ["gpt-4o"]
            request_timeout_secs = 30

            [local]
            base_url = "http://gpu-01:8000/v1"
            backend = "open_ai_compatible"

            [sampling]
            temperature = 0.2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.local.base_url, "http://gpu-01:8000/v1");
        assert_eq!(cfg.local.backend, LocalBackend::OpenAiCompatible);
        assert_eq!(cfg.cloud_models, vec!["gpt-4o".to_string()]);
        assert!((cfg.sampling.temperature - 0.2).abs() < f64::EPSILON);
        assert!((cfg.sampling.top_p - 0.9).abs() < f64::EPSILON);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn cloud_section_parses() {
        let cfg = RunnerConfig::from_toml(
            r#"
            [cloud]
            base_url = "https://proxy.example/v1"
            api_key = "sk-test"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.cloud.unwrap().api_key, "sk-test");
    }

    #[test]
    fn invalid_sampling_rejected() {
        let mut cfg = RunnerConfig::default();
        cfg.sampling.top_p = 0.0;
        assert!(cfg.validate().is_err());
        cfg.sampling.top_p = 0.9;
        cfg.sampling.temperature = 3.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn backend_aliases() {
        assert_eq!(LocalBackend::from_env_value("vLLM"), Some(LocalBackend::OpenAiCompatible));
        assert_eq!(LocalBackend::from_env_value("ollama"), Some(LocalBackend::Ollama));
        assert_eq!(LocalBackend::from_env_value("tgi"), None);
    }
}
