//! OpenAI-compatible backend implementation
//!
//! This backend handles providers that use OpenAI's API format, including:
//! - OpenAI (api.openai.com)
//! - Azure OpenAI
//! - Together AI
//! - Groq
//! - Fireworks AI
//! - Any other OpenAI-compatible provider

use super::backend::{error_from_response, BackendCompletion, BackendConfig, ExternalBackend};
use crate::{BackendError, ChatCompletionParams, ChatMessage, CompletionParams, TokenUsage};
use async_trait::async_trait;
use reqwest::{header::HeaderValue, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// OpenAI-compatible backend
///
/// Pass-through implementation for providers that implement OpenAI's API format.
pub struct OpenAiCompatibleBackend {
    client: Client,
}

impl OpenAiCompatibleBackend {
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .build()
            .unwrap_or_default();

        Self { client }
    }

    fn build_headers(
        &self,
        config: &BackendConfig,
    ) -> Result<reqwest::header::HeaderMap, BackendError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        // Authorization header
        let auth_value = format!("Bearer {}", config.api_key);
        let header_value = HeaderValue::from_str(&auth_value)
            .map_err(|e| BackendError::InvalidCredentials(format!("Invalid API key format: {e}")))?;
        headers.insert("Authorization", header_value);

        // OpenAI organization header (if provided)
        if let Some(org_id) = config.extra.get("organization_id") {
            if let Ok(value) = HeaderValue::from_str(org_id) {
                headers.insert("OpenAI-Organization", value);
            }
        }

        Ok(headers)
    }

    async fn post_json<B, R>(
        &self,
        config: &BackendConfig,
        path: &str,
        body: &B,
    ) -> Result<R, BackendError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let url = config.endpoint(path);
        let headers = self.build_headers(config)?;

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .timeout(config.timeout())
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let raw_bytes = response.bytes().await?;
        serde_json::from_slice(&raw_bytes)
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {e}")))
    }
}

impl Default for OpenAiCompatibleBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    /// Newer OpenAI models reject `max_tokens` on the chat endpoint
    max_completion_tokens: i64,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiTextRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: i64,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<OpenAiChatChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiTextResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<OpenAiTextChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiTextChoice {
    text: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: i32,
    #[serde(default)]
    completion_tokens: i32,
}

impl From<Option<OpenAiUsage>> for TokenUsage {
    fn from(usage: Option<OpenAiUsage>) -> Self {
        usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default()
    }
}

#[async_trait]
impl ExternalBackend for OpenAiCompatibleBackend {
    fn backend_type(&self) -> &'static str {
        "openai_compatible"
    }

    async fn chat_completion(
        &self,
        config: &BackendConfig,
        params: ChatCompletionParams,
    ) -> Result<BackendCompletion, BackendError> {
        let request = OpenAiChatRequest {
            model: &params.model,
            messages: &params.messages,
            max_completion_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let response: OpenAiChatResponse =
            self.post_json(config, "chat/completions", &request).await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            BackendError::InvalidResponse("Response contained no choices".to_string())
        })?;

        Ok(BackendCompletion {
            text: choice.message.content.unwrap_or_default(),
            model: response.model.unwrap_or(params.model),
            usage: response.usage.into(),
        })
    }

    async fn text_completion(
        &self,
        config: &BackendConfig,
        params: CompletionParams,
    ) -> Result<BackendCompletion, BackendError> {
        let request = OpenAiTextRequest {
            model: &params.model,
            prompt: &params.prompt,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
        };

        let response: OpenAiTextResponse = self.post_json(config, "completions", &request).await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            BackendError::InvalidResponse("Response contained no choices".to_string())
        })?;

        Ok(BackendCompletion {
            text: choice.text,
            model: response.model.unwrap_or(params.model),
            usage: response.usage.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MessageRole, ProviderErrorKind};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn config_for(server: &MockServer) -> BackendConfig {
        BackendConfig {
            base_url: server.url("/v1"),
            api_key: "sk-test-key".to_string(),
            timeout_seconds: 5,
            extra: HashMap::new(),
        }
    }

    fn chat_params() -> ChatCompletionParams {
        ChatCompletionParams {
            model: "gpt-4o-mini".to_string(),
            messages: vec![
                ChatMessage::new(MessageRole::System, "be brief"),
                ChatMessage::user("hi"),
            ],
            max_tokens: 256,
            temperature: 0.5,
        }
    }

    // ==================== Header Building Tests ====================

    #[test]
    fn test_build_headers_basic() {
        let backend = OpenAiCompatibleBackend::new();
        let config = BackendConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: "sk-test-key-123".to_string(),
            timeout_seconds: 30,
            extra: HashMap::new(),
        };

        let headers = backend.build_headers(&config).unwrap();

        assert_eq!(
            headers.get("Authorization").unwrap().to_str().unwrap(),
            "Bearer sk-test-key-123"
        );
        assert_eq!(
            headers.get("Content-Type").unwrap().to_str().unwrap(),
            "application/json"
        );
        assert!(headers.get("OpenAI-Organization").is_none());
    }

    #[test]
    fn test_build_headers_with_organization() {
        let backend = OpenAiCompatibleBackend::new();
        let mut extra = HashMap::new();
        extra.insert("organization_id".to_string(), "org-abc123".to_string());

        let config = BackendConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: "sk-test-key".to_string(),
            timeout_seconds: 30,
            extra,
        };

        let headers = backend.build_headers(&config).unwrap();

        assert_eq!(
            headers
                .get("OpenAI-Organization")
                .unwrap()
                .to_str()
                .unwrap(),
            "org-abc123"
        );
    }

    #[test]
    fn test_build_headers_rejects_unprintable_key() {
        let backend = OpenAiCompatibleBackend::new();
        let config = BackendConfig {
            api_key: "sk-bad\nkey".to_string(),
            ..Default::default()
        };

        let err = backend.build_headers(&config).unwrap_err();
        assert_eq!(err.kind(), ProviderErrorKind::Unauthorized);
    }

    #[test]
    fn test_backend_type() {
        let backend = OpenAiCompatibleBackend::default();
        assert_eq!(backend.backend_type(), "openai_compatible");
    }

    // ==================== Wire Format Tests ====================

    #[tokio::test]
    async fn test_chat_completion_wire_format() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("Authorization", "Bearer sk-test-key")
                    .json_body(json!({
                        "model": "gpt-4o-mini",
                        "messages": [
                            {"role": "system", "content": "be brief"},
                            {"role": "user", "content": "hi"}
                        ],
                        "max_completion_tokens": 256,
                        "temperature": 0.5,
                        "stream": false
                    }));
                then.status(200).json_body(json!({
                    "id": "chatcmpl-1",
                    "object": "chat.completion",
                    "model": "gpt-4o-mini-2024-07-18",
                    "choices": [{
                        "index": 0,
                        "message": {"role": "assistant", "content": "hello!"},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 9, "completion_tokens": 2, "total_tokens": 11}
                }));
            })
            .await;

        let backend = OpenAiCompatibleBackend::new();
        let result = backend
            .chat_completion(&config_for(&server), chat_params())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.text, "hello!");
        assert_eq!(result.model, "gpt-4o-mini-2024-07-18");
        assert_eq!(result.usage, TokenUsage::new(9, 2));
    }

    #[tokio::test]
    async fn test_text_completion_uses_legacy_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/completions").json_body(json!({
                    "model": "gpt-3.5-turbo-instruct",
                    "prompt": "hi",
                    "max_tokens": 16,
                    "temperature": 0.0,
                    "stream": false
                }));
                then.status(200).json_body(json!({
                    "choices": [{"text": " there", "index": 0}],
                    "usage": {"prompt_tokens": 1, "completion_tokens": 1}
                }));
            })
            .await;

        let backend = OpenAiCompatibleBackend::new();
        let result = backend
            .text_completion(
                &config_for(&server),
                CompletionParams {
                    model: "gpt-3.5-turbo-instruct".to_string(),
                    prompt: "hi".to_string(),
                    max_tokens: 16,
                    temperature: 0.0,
                },
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.text, " there");
        // Model falls back to the requested one when the provider omits it
        assert_eq!(result.model, "gpt-3.5-turbo-instruct");
        assert_eq!(result.usage.total_tokens, 2);
    }

    #[tokio::test]
    async fn test_missing_usage_defaults_to_zero() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "ok"}}]
                }));
            })
            .await;

        let backend = OpenAiCompatibleBackend::new();
        let result = backend
            .chat_completion(&config_for(&server), chat_params())
            .await
            .unwrap();
        assert_eq!(result.usage, TokenUsage::default());
    }

    #[tokio::test]
    async fn test_huge_usage_saturates_total() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "ok"}}],
                    "usage": {"prompt_tokens": 2147483647, "completion_tokens": 5}
                }));
            })
            .await;

        let backend = OpenAiCompatibleBackend::new();
        let result = backend
            .chat_completion(&config_for(&server), chat_params())
            .await
            .unwrap();
        assert_eq!(result.usage.prompt_tokens, i32::MAX);
        assert_eq!(result.usage.completion_tokens, 5);
        assert_eq!(result.usage.total_tokens, i32::MAX);
    }

    // ==================== Error Classification Tests ====================

    async fn chat_error_for_status(status: u16) -> BackendError {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(status).json_body(json!({
                    "error": {"message": format!("status {status}"), "type": "test"}
                }));
            })
            .await;

        OpenAiCompatibleBackend::new()
            .chat_completion(&config_for(&server), chat_params())
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn test_status_codes_are_classified() {
        let cases = [
            (401, ProviderErrorKind::Unauthorized),
            (403, ProviderErrorKind::Unauthorized),
            (404, ProviderErrorKind::Upstream),
            (429, ProviderErrorKind::RateLimited),
            (500, ProviderErrorKind::Upstream),
            (503, ProviderErrorKind::Upstream),
            (504, ProviderErrorKind::Timeout),
        ];

        for (status, expected) in cases {
            let err = chat_error_for_status(status).await;
            assert_eq!(err.kind(), expected, "status {status}");
            match err {
                BackendError::HttpError {
                    status_code,
                    message,
                } => {
                    assert_eq!(status_code, status);
                    assert_eq!(message, format!("status {status}"));
                }
                other => panic!("expected HttpError, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_upstream_404_is_an_upstream_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(404).json_body(json!({
                    "error": {"message": "The model `gpt-4o-mini` does not exist"}
                }));
            })
            .await;

        let err = OpenAiCompatibleBackend::new()
            .chat_completion(&config_for(&server), chat_params())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ProviderErrorKind::Upstream);
        assert_ne!(err.kind(), ProviderErrorKind::NotConfigured);
    }

    #[tokio::test]
    async fn test_empty_choices_is_invalid_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({"choices": []}));
            })
            .await;

        let err = OpenAiCompatibleBackend::new()
            .chat_completion(&config_for(&server), chat_params())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
        assert_eq!(err.kind(), ProviderErrorKind::Upstream);
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200)
                    .delay(std::time::Duration::from_secs(3))
                    .json_body(json!({"choices": []}));
            })
            .await;

        let config = BackendConfig {
            timeout_seconds: 1,
            ..config_for(&server)
        };

        let err = OpenAiCompatibleBackend::new()
            .chat_completion(&config, chat_params())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout(_)), "got {err:?}");
        assert_eq!(err.kind(), ProviderErrorKind::Timeout);
    }

    #[tokio::test]
    async fn test_unreachable_provider_is_upstream() {
        let config = BackendConfig {
            // Port 9 (discard) is not listening in test environments
            base_url: "http://127.0.0.1:9/v1".to_string(),
            api_key: "sk-test".to_string(),
            timeout_seconds: 2,
            extra: HashMap::new(),
        };

        let err = OpenAiCompatibleBackend::new()
            .chat_completion(&config, chat_params())
            .await
            .unwrap_err();
        assert!(
            matches!(err.kind(), ProviderErrorKind::Upstream | ProviderErrorKind::Timeout),
            "got {err:?}"
        );
    }
}
