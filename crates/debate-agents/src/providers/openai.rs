//! OpenAI-compatible `/chat/completions` client.

use std::time::Duration;

use async_trait::async_trait;
use debate_core::{Completion, CompletionError, CompletionRequest, CompletionResponse, TokenUsage};
use serde_json::{json, Value};
use tracing::debug;

use super::{count, http_client, read_json, Sampling};

pub struct OpenAiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    sampling: Sampling,
}

impl OpenAiProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        sampling: Sampling,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            sampling,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Request body for one chat completion.
pub fn request_body(request: &CompletionRequest, sampling: &Sampling) -> Value {
    let mut body = json!({
        "model": request.model,
        "messages": request.messages,
        "temperature": sampling.temperature,
        "top_p": sampling.top_p,
        "max_tokens": sampling.max_tokens,
    });
    if let Some(format) = &request.response_format {
        body["response_format"] = json!({
            "type": "json_schema",
            "json_schema": {
                "name": format.name,
                "schema": format.schema,
            }
        });
    }
    body
}

/// Extract text and usage from a `/chat/completions` response.
pub fn parse_response(model: &str, body: &Value) -> Result<CompletionResponse, CompletionError> {
    let choice = body["choices"]
        .get(0)
        .ok_or_else(|| CompletionError::Decode("response has no choices".to_string()))?;
    let text = choice["message"]["content"]
        .as_str()
        .ok_or_else(|| CompletionError::EmptyResponse(model.to_string()))?;

    Ok(CompletionResponse {
        text: text.to_string(),
        usage: TokenUsage {
            prompt_token: count(&body["usage"]["prompt_tokens"]),
            generated_token: count(&body["usage"]["completion_tokens"]),
        },
    })
}

#[async_trait]
impl Completion for OpenAiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let body = request_body(&request, &self.sampling);
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            structured = request.response_format.is_some(),
            "POST {}",
            self.endpoint()
        );

        let mut builder = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        let json = read_json(response).await?;
        parse_response(&request.model, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_core::{belief_response_format, ChatMessage};

    fn sampling() -> Sampling {
        Sampling {
            temperature: 0.7,
            top_p: 0.9,
            max_tokens: 2048,
        }
    }

    #[test]
    fn text_request_body() {
        let req = CompletionRequest::text(
            "gpt-4o-mini-2024-07-18",
            vec![ChatMessage::system("You are Agent 1. x"), ChatMessage::user("q")],
        );
        let body = request_body(&req, &sampling());
        assert_eq!(body["model"], "gpt-4o-mini-2024-07-18");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "q");
        assert_eq!(body["max_tokens"], 2048);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn structured_request_carries_schema() {
        let req = CompletionRequest::structured(
            "m",
            vec![ChatMessage::user("rate")],
            belief_response_format(),
        );
        let body = request_body(&req, &sampling());
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "belief_schema");
        assert!(body["response_format"]["json_schema"]["schema"]["properties"]
            .get("updated_strength")
            .is_some());
    }

    #[test]
    fn parses_text_and_usage() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "Answer: C"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 9, "total_tokens": 129}
        });
        let out = parse_response("m", &body).unwrap();
        assert_eq!(out.text, "Answer: C");
        assert_eq!(out.usage.prompt_token, 120);
        assert_eq!(out.usage.generated_token, 9);
    }

    #[test]
    fn missing_usage_counts_zero() {
        let body = json!({"choices": [{"message": {"content": "ok"}}]});
        assert_eq!(parse_response("m", &body).unwrap().usage, TokenUsage::default());
    }

    #[test]
    fn rejects_empty_choices_and_null_content() {
        assert!(matches!(
            parse_response("m", &json!({"choices": []})),
            Err(CompletionError::Decode(_))
        ));
        assert!(matches!(
            parse_response("m", &json!({"choices": [{"message": {"content": null}}]})),
            Err(CompletionError::EmptyResponse(_))
        ));
    }

    #[test]
    fn endpoint_strips_trailing_slash() {
        let p = OpenAiProvider::new(
            "http://localhost:8000/v1/",
            None,
            sampling(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(p.endpoint(), "http://localhost:8000/v1/chat/completions");
    }
}
