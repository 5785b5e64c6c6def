//! Inference providers crate: one adapter per upstream LLM provider
//!
//! Every adapter exposes the same two operations, a prompt completion and a
//! chat completion, and reports failures with the shared [`ProviderError`]
//! taxonomy so the router can decide on fallback without knowing which
//! provider it talked to.
//!
//! # Usage
//!
//! ```rust,ignore
//! use inference_providers::{ChatCompletionParams, ChatMessage, InferenceProvider};
//!
//! async fn example<P: InferenceProvider>(provider: P) {
//!     let params = ChatCompletionParams {
//!         model: "gpt-4o-mini".to_string(),
//!         messages: vec![ChatMessage::user("hi")],
//!         max_tokens: 256,
//!         temperature: 0.7,
//!     };
//!
//!     match provider.chat_completion(params).await {
//!         Ok(result) => println!("{} answered: {}", result.provider_id, result.text),
//!         Err(e) => eprintln!("{} failed: {}", e.provider_id, e.kind),
//!     }
//! }
//! ```

pub mod external;
pub mod mock;
pub mod models;

use async_trait::async_trait;

// Re-export commonly used types for convenience
pub use mock::{MockOperation, MockProvider, MockReply, RecordedCall};
pub use models::{
    BackendError, ChatCompletionParams, ChatMessage, CompletionParams, CompletionResult,
    MessageRole, ProviderError, ProviderErrorKind, TokenUsage,
};

// External provider exports
pub use external::{
    AnthropicBackend, ExternalProvider, ExternalProviderConfig, OpenAiCompatibleBackend,
    ProviderConfig,
};

/// Uniform contract every provider adapter implements.
///
/// Implementations perform exactly one outbound call per invocation, bound it
/// with a timeout, and never retry.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Identifier this adapter is registered under (e.g. "openai")
    fn provider_id(&self) -> &str;

    /// Wire format spoken upstream (e.g. "openai_compatible"). Providers with
    /// the same backend type accept the same concrete model names.
    fn backend_type(&self) -> &str;

    /// Performs a prompt-style completion
    async fn text_completion(
        &self,
        params: CompletionParams,
    ) -> Result<CompletionResult, ProviderError>;

    /// Performs a chat completion over an ordered message list
    async fn chat_completion(
        &self,
        params: ChatCompletionParams,
    ) -> Result<CompletionResult, ProviderError>;
}

/// Pull a human readable message out of a provider error body.
///
/// OpenAI and Anthropic both nest it under `error.message`; anything else is
/// returned trimmed as-is.
pub fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| match error {
                    serde_json::Value::String(s) => Some(s.clone()),
                    other => other
                        .get("message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string),
                })
                .or_else(|| {
                    value
                        .get("message")
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_openai_shape() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "Incorrect API key provided");
    }

    #[test]
    fn test_extract_error_message_anthropic_shape() {
        let body = r#"{"type": "error", "error": {"type": "overloaded_error", "message": "Overloaded"}}"#;
        assert_eq!(extract_error_message(body), "Overloaded");
    }

    #[test]
    fn test_extract_error_message_plain_text() {
        assert_eq!(extract_error_message("  upstream exploded \n"), "upstream exploded");
    }

    #[test]
    fn test_extract_error_message_string_error() {
        assert_eq!(extract_error_message(r#"{"error": "nope"}"#), "nope");
    }
}
