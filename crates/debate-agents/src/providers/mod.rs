//! HTTP [`Completion`] backends.
//!
//! - [`OpenAiProvider`]: `/chat/completions` (OpenAI, vLLM, llama.cpp)
//! - [`OllamaProvider`]: Ollama's native `/api/chat`
//! - [`ProviderRouter`]: picks one of the above per request model
//!
//! [`Completion`]: debate_core::Completion

pub mod ollama;
pub mod openai;
pub mod router;

use std::time::Duration;

use debate_core::CompletionError;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use router::ProviderRouter;

/// Per-provider sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, CompletionError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CompletionError::Request(format!("failed to build HTTP client: {e}")))
}

/// Check the status and decode the body as JSON.
pub(crate) async fn read_json(
    response: reqwest::Response,
) -> Result<serde_json::Value, CompletionError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CompletionError::Status {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json()
        .await
        .map_err(|e| CompletionError::Decode(e.to_string()))
}

/// Token counts are optional in both wire formats; missing means 0.
pub(crate) fn count(value: &serde_json::Value) -> u64 {
    value.as_u64().unwrap_or(0)
}
