//! Per-model dispatch between the local and cloud backends.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use debate_core::{Completion, CompletionError, CompletionRequest, CompletionResponse};
use tracing::info;

use super::{OllamaProvider, OpenAiProvider, Sampling};
use crate::config::{LocalBackend, RunnerConfig};

/// Which backend a model id resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Local,
    Cloud,
}

pub struct ProviderRouter {
    local: Arc<dyn Completion>,
    cloud: Option<Arc<dyn Completion>>,
    cloud_models: HashSet<String>,
}

impl ProviderRouter {
    pub fn new(
        local: Arc<dyn Completion>,
        cloud: Option<Arc<dyn Completion>>,
        cloud_models: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            local,
            cloud,
            cloud_models: cloud_models.into_iter().collect(),
        }
    }

    /// Build the HTTP backends described by `config`.
    pub fn from_config(config: &RunnerConfig) -> Result<Self, CompletionError> {
        let timeout = config.request_timeout();
        let local_sampling = Sampling {
            temperature: config.sampling.temperature,
            top_p: config.sampling.top_p,
            max_tokens: config.sampling.local_max_tokens,
        };
        let local: Arc<dyn Completion> = match config.local.backend {
            LocalBackend::Ollama => Arc::new(OllamaProvider::new(
                &config.local.base_url,
                local_sampling,
                timeout,
            )?) as Arc<dyn Completion>,
            LocalBackend::OpenAiCompatible => Arc::new(OpenAiProvider::new(
                &config.local.base_url,
                config.local.api_key.clone(),
                local_sampling,
                timeout,
            )?),
        };

        let cloud = match &config.cloud {
            Some(endpoint) => {
                let provider = OpenAiProvider::new(
                    &endpoint.base_url,
                    Some(endpoint.api_key.clone()),
                    Sampling {
                        temperature: config.sampling.temperature,
                        top_p: config.sampling.top_p,
                        max_tokens: config.sampling.cloud_max_tokens,
                    },
                    timeout,
                )?;
                Some(Arc::new(provider) as Arc<dyn Completion>)
            }
            None => None,
        };

        info!(
            local = %config.local.base_url,
            backend = ?config.local.backend,
            cloud = config.cloud.is_some(),
            "Inference providers configured"
        );
        Ok(Self::new(local, cloud, config.cloud_models.iter().cloned()))
    }

    pub fn route(&self, model: &str) -> Route {
        if self.cloud_models.contains(model) {
            Route::Cloud
        } else {
            Route::Local
        }
    }

    fn backend(&self, model: &str) -> Result<&Arc<dyn Completion>, CompletionError> {
        match self.route(model) {
            Route::Local => Ok(&self.local),
            Route::Cloud => self.cloud.as_ref().ok_or_else(|| {
                CompletionError::Request(format!(
                    "model {model} is served by the cloud provider but no API key is configured"
                ))
            }),
        }
    }
}

#[async_trait]
impl Completion for ProviderRouter {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.backend(&request.model)?.complete(request).await
    }
}
