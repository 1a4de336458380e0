//! Ollama `/api/chat` client.
//!
//! Structured requests pass the JSON schema through Ollama's `format` field.

use std::time::Duration;

use async_trait::async_trait;
use debate_core::{Completion, CompletionError, CompletionRequest, CompletionResponse, TokenUsage};
use serde_json::{json, Value};
use tracing::debug;

use super::{count, http_client, read_json, Sampling};

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    sampling: Sampling,
}

impl OllamaProvider {
    pub fn new(
        base_url: impl Into<String>,
        sampling: Sampling,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            sampling,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

pub fn request_body(request: &CompletionRequest, sampling: &Sampling) -> Value {
    let mut body = json!({
        "model": request.model,
        "messages": request.messages,
        "stream": false,
        "options": {
            "temperature": sampling.temperature,
            "top_p": sampling.top_p,
            "num_predict": sampling.max_tokens,
        },
    });
    if let Some(format) = &request.response_format {
        body["format"] = format.schema.clone();
    }
    body
}

pub fn parse_response(model: &str, body: &Value) -> Result<CompletionResponse, CompletionError> {
    if let Some(err) = body["error"].as_str() {
        return Err(CompletionError::Decode(err.to_string()));
    }
    let text = body["message"]["content"]
        .as_str()
        .ok_or_else(|| CompletionError::EmptyResponse(model.to_string()))?;

    Ok(CompletionResponse {
        text: text.to_string(),
        usage: TokenUsage {
            prompt_token: count(&body["prompt_eval_count"]),
            generated_token: count(&body["eval_count"]),
        },
    })
}

#[async_trait]
impl Completion for OllamaProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let body = request_body(&request, &self.sampling);
        debug!(model = %request.model, messages = request.messages.len(), "POST {}", self.endpoint());

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        let json = read_json(response).await?;
        parse_response(&request.model, &json)
    }
}
