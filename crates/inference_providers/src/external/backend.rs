//! Backend trait for external provider implementations
//!
//! This module defines the internal abstraction for different external AI providers.
//! Each backend handles the API-specific translation between our internal format
//! and the provider's native format.

use crate::{
    BackendError, ChatCompletionParams, ChatMessage, CompletionParams, MessageRole, TokenUsage,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Configuration for a backend connection
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL for the provider API
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Provider-specific extra configuration (e.g., organization_id, version)
    pub extra: HashMap<String, String>,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Join the base URL and an endpoint path without doubling slashes
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_seconds: 60,
            extra: HashMap::new(),
        }
    }
}

/// What a backend hands back before the provider id is attached
#[derive(Debug, Clone, PartialEq)]
pub struct BackendCompletion {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// Internal backend trait for different API formats
#[async_trait]
pub trait ExternalBackend: Send + Sync {
    /// Returns the backend type identifier (e.g., "openai_compatible", "anthropic")
    fn backend_type(&self) -> &'static str;

    /// Performs a non-streaming chat completion request
    ///
    /// The backend is responsible for:
    /// - Translating ChatCompletionParams to provider-specific format
    /// - Making the HTTP request with the configured timeout
    /// - Parsing the response into a BackendCompletion
    async fn chat_completion(
        &self,
        config: &BackendConfig,
        params: ChatCompletionParams,
    ) -> Result<BackendCompletion, BackendError>;

    /// Performs a prompt completion request
    ///
    /// Default implementation sends the prompt as a single user message through
    /// the chat endpoint, for providers without a legacy completions API.
    async fn text_completion(
        &self,
        config: &BackendConfig,
        params: CompletionParams,
    ) -> Result<BackendCompletion, BackendError> {
        let CompletionParams {
            model,
            prompt,
            max_tokens,
            temperature,
        } = params;

        self.chat_completion(
            config,
            ChatCompletionParams {
                model,
                messages: vec![ChatMessage::new(MessageRole::User, prompt)],
                max_tokens,
                temperature,
            },
        )
        .await
    }
}

/// Turn a non-success response into a `BackendError::HttpError`
pub(crate) async fn error_from_response(response: reqwest::Response) -> BackendError {
    let status_code = response.status().as_u16();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|e| format!("Failed to read error response body: {e}"));
    BackendError::HttpError {
        status_code,
        message: crate::extract_error_message(&error_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_cleanly() {
        let config = BackendConfig {
            base_url: "https://api.openai.com/v1/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint("chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );

        let config = BackendConfig {
            base_url: "https://api.anthropic.com/v1".to_string(),
            ..Default::default()
        };
        assert_eq!(config.endpoint("messages"), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn test_timeout_duration() {
        let config = BackendConfig {
            timeout_seconds: 15,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(15));
    }
}
