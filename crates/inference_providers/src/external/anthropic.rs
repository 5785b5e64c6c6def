//! Anthropic backend implementation
//!
//! This backend handles Anthropic's Messages API, translating between our
//! OpenAI-style message list and Anthropic's native format.

use super::backend::{error_from_response, BackendCompletion, BackendConfig, ExternalBackend};
use crate::{BackendError, ChatCompletionParams, ChatMessage, MessageRole, TokenUsage};
use async_trait::async_trait;
use reqwest::{header::HeaderValue, Client};
use serde::{Deserialize, Serialize};

/// Default Anthropic API version
pub const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic backend
///
/// Translates between OpenAI-compatible format and Anthropic's Messages API.
pub struct AnthropicBackend {
    client: Client,
}

impl AnthropicBackend {
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

        // Anthropic uses x-api-key header
        let header_value = HeaderValue::from_str(&config.api_key)
            .map_err(|e| BackendError::InvalidCredentials(format!("Invalid API key format: {e}")))?;
        headers.insert("x-api-key", header_value);

        // Anthropic version header
        let version = config
            .extra
            .get("version")
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_ANTHROPIC_VERSION);
        if let Ok(value) = HeaderValue::from_str(version) {
            headers.insert("anthropic-version", value);
        }

        Ok(headers)
    }

    /// Convert OpenAI messages to Anthropic format
    ///
    /// System messages move to the top-level `system` parameter (joined when
    /// there are several). Tool output is replayed as user content.
    fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<AnthropicMessage>) {
        let mut system_parts = Vec::new();
        let mut anthropic_messages = Vec::new();

        for msg in messages {
            match msg.role {
                MessageRole::System => system_parts.push(msg.content.clone()),
                MessageRole::User | MessageRole::Tool => {
                    anthropic_messages.push(AnthropicMessage {
                        role: "user".to_string(),
                        content: msg.content.clone(),
                    });
                }
                MessageRole::Assistant => {
                    anthropic_messages.push(AnthropicMessage {
                        role: "assistant".to_string(),
                        content: msg.content.clone(),
                    });
                }
            }
        }

        let system = (!system_parts.is_empty()).then(|| system_parts.join("\n\n"));
        (system, anthropic_messages)
    }
}

impl Default for AnthropicBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Anthropic message format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

/// Anthropic request format
#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    type_: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: i32,
    #[serde(default)]
    output_tokens: i32,
}

/// Anthropic non-streaming response
#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: AnthropicUsage,
}

impl AnthropicResponse {
    /// Concatenate the text blocks, skipping tool_use and friends
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|block| block.type_ == "text")
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

#[async_trait]
impl ExternalBackend for AnthropicBackend {
    fn backend_type(&self) -> &'static str {
        "anthropic"
    }

    async fn chat_completion(
        &self,
        config: &BackendConfig,
        params: ChatCompletionParams,
    ) -> Result<BackendCompletion, BackendError> {
        let url = config.endpoint("messages");

        let (system, messages) = Self::convert_messages(&params.messages);

        let request = AnthropicRequest {
            model: params.model.clone(),
            messages,
            max_tokens: params.max_tokens,
            system,
            temperature: params.temperature,
            stream: false,
        };

        let headers = self.build_headers(config)?;

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .timeout(config.timeout())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let raw_bytes = response.bytes().await?;
        let anthropic_response: AnthropicResponse = serde_json::from_slice(&raw_bytes)
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        Ok(BackendCompletion {
            text: anthropic_response.text(),
            model: anthropic_response
                .model
                .clone()
                .unwrap_or(params.model),
            usage: TokenUsage::new(
                anthropic_response.usage.input_tokens,
                anthropic_response.usage.output_tokens,
            ),
        })
    }
}
