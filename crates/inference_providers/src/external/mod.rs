//! External provider module for third-party AI providers
//!
//! This module provides a unified `ExternalProvider` that abstracts different
//! external AI providers (OpenAI, Anthropic, etc.) behind a single
//! implementation of the `InferenceProvider` trait.
//!
//! # Architecture
//!
//! ```text
//! ExternalProvider (implements InferenceProvider)
//!     └── backends:
//!         ├── OpenAiCompatibleBackend (OpenAI, Azure, Together, Groq, etc.)
//!         └── AnthropicBackend
//! ```
//!
//! # Adding New Providers
//!
//! 1. **If OpenAI-compatible**: declare it in the config file with
//!    `backend: openai_compatible` and the provider's `base_url`.
//!
//! 2. **If different API format**: Add new backend file implementing `ExternalBackend`

pub mod anthropic;
pub mod backend;
pub mod openai_compatible;

use crate::{
    ChatCompletionParams, CompletionParams, CompletionResult, InferenceProvider, ProviderError,
};
use async_trait::async_trait;
use backend::{BackendCompletion, BackendConfig, ExternalBackend};
use std::collections::HashMap;
use std::sync::Arc;

pub use anthropic::{AnthropicBackend, DEFAULT_ANTHROPIC_VERSION};
pub use backend::BackendConfig as ExternalBackendConfig;
pub use openai_compatible::OpenAiCompatibleBackend;

/// Wire format and endpoint of an external provider
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    /// OpenAI-compatible providers (OpenAI, Azure, Together, Groq, Fireworks, etc.)
    OpenAiCompatible {
        /// Base URL for the API (e.g., "https://api.openai.com/v1")
        base_url: String,
        /// Optional organization ID for OpenAI
        organization_id: Option<String>,
    },

    /// Anthropic provider
    Anthropic {
        /// Base URL for the API (e.g., "https://api.anthropic.com/v1")
        base_url: String,
        /// API version, `None` means [`DEFAULT_ANTHROPIC_VERSION`]
        version: Option<String>,
    },
}

/// Configuration for an external provider
#[derive(Debug, Clone)]
pub struct ExternalProviderConfig {
    /// Identifier the provider is registered under
    pub provider_id: String,
    pub provider_config: ProviderConfig,
    /// API key for authentication
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// External provider facade
///
/// Implements `InferenceProvider` by delegating to the appropriate backend
/// based on the provider configuration.
pub struct ExternalProvider {
    provider_id: String,
    backend: Arc<dyn ExternalBackend>,
    config: BackendConfig,
}

impl ExternalProvider {
    /// Create a new external provider with the given configuration
    pub fn new(external_config: ExternalProviderConfig) -> Self {
        let ExternalProviderConfig {
            provider_id,
            provider_config,
            api_key,
            timeout_seconds,
        } = external_config;

        let mut extra = HashMap::new();
        let (backend, base_url): (Arc<dyn ExternalBackend>, String) = match provider_config {
            ProviderConfig::OpenAiCompatible {
                base_url,
                organization_id,
            } => {
                if let Some(org_id) = organization_id {
                    extra.insert("organization_id".to_string(), org_id);
                }
                (Arc::new(OpenAiCompatibleBackend::new()), base_url)
            }
            ProviderConfig::Anthropic { base_url, version } => {
                extra.insert(
                    "version".to_string(),
                    version.unwrap_or_else(|| DEFAULT_ANTHROPIC_VERSION.to_string()),
                );
                (Arc::new(AnthropicBackend::new()), base_url)
            }
        };

        Self {
            provider_id,
            backend,
            config: BackendConfig {
                base_url,
                api_key,
                timeout_seconds,
                extra,
            },
        }
    }

    fn finish(
        &self,
        outcome: Result<BackendCompletion, crate::BackendError>,
    ) -> Result<CompletionResult, ProviderError> {
        match outcome {
            Ok(completion) => Ok(CompletionResult {
                text: completion.text,
                provider_id: self.provider_id.clone(),
                concrete_model_name: completion.model,
                usage: completion.usage,
            }),
            Err(e) => {
                tracing::debug!(
                    provider_id = %self.provider_id,
                    backend = self.backend.backend_type(),
                    error = %e,
                    "External backend call failed"
                );
                Err(ProviderError::from_backend(&self.provider_id, e))
            }
        }
    }
}

#[async_trait]
impl InferenceProvider for ExternalProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn backend_type(&self) -> &str {
        self.backend.backend_type()
    }

    async fn text_completion(
        &self,
        params: CompletionParams,
    ) -> Result<CompletionResult, ProviderError> {
        let outcome = self.backend.text_completion(&self.config, params).await;
        self.finish(outcome)
    }

    async fn chat_completion(
        &self,
        params: ChatCompletionParams,
    ) -> Result<CompletionResult, ProviderError> {
        let outcome = self.backend.chat_completion(&self.config, params).await;
        self.finish(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatMessage, ProviderErrorKind, TokenUsage};
    use httpmock::prelude::*;
    use serde_json::json;

    fn openai_config(base_url: String) -> ExternalProviderConfig {
        ExternalProviderConfig {
            provider_id: "openai".to_string(),
            provider_config: ProviderConfig::OpenAiCompatible {
                base_url,
                organization_id: None,
            },
            api_key: "test-key".to_string(),
            timeout_seconds: 5,
        }
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_create_external_provider_openai() {
        let provider = ExternalProvider::new(ExternalProviderConfig {
            provider_config: ProviderConfig::OpenAiCompatible {
                base_url: "https://api.openai.com/v1".to_string(),
                organization_id: Some("org-1".to_string()),
            },
            ..openai_config(String::new())
        });

        assert_eq!(provider.backend_type(), "openai_compatible");
        assert_eq!(provider.provider_id(), "openai");
        assert_eq!(
            provider.config.extra.get("organization_id").map(String::as_str),
            Some("org-1")
        );
    }

    #[test]
    fn test_create_external_provider_anthropic_default_version() {
        let provider = ExternalProvider::new(ExternalProviderConfig {
            provider_id: "anthropic".to_string(),
            provider_config: ProviderConfig::Anthropic {
                base_url: "https://api.anthropic.com/v1".to_string(),
                version: None,
            },
            api_key: "sk-ant".to_string(),
            timeout_seconds: 30,
        });

        assert_eq!(provider.backend_type(), "anthropic");
        assert_eq!(provider.provider_id(), "anthropic");
        assert_eq!(
            provider.config.extra.get("version").map(String::as_str),
            Some(DEFAULT_ANTHROPIC_VERSION)
        );
        assert_eq!(provider.config.timeout_seconds, 30);
    }

    // ==================== Result Attribution Tests ====================

    #[tokio::test]
    async fn test_success_is_annotated_with_provider_id() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({
                    "model": "gpt-4o-mini-2024-07-18",
                    "choices": [{"index": 0, "message": {"role": "assistant", "content": "4"}}],
                    "usage": {"prompt_tokens": 8, "completion_tokens": 1, "total_tokens": 9}
                }));
            })
            .await;

        let provider = ExternalProvider::new(openai_config(server.url("/v1")));
        let result = provider
            .chat_completion(ChatCompletionParams {
                model: "gpt-4o-mini".to_string(),
                messages: vec![ChatMessage::user("2+2?")],
                max_tokens: 8,
                temperature: 0.0,
            })
            .await
            .unwrap();

        assert_eq!(
            result,
            CompletionResult {
                text: "4".to_string(),
                provider_id: "openai".to_string(),
                concrete_model_name: "gpt-4o-mini-2024-07-18".to_string(),
                usage: TokenUsage::new(8, 1),
            }
        );
    }

    #[tokio::test]
    async fn test_failure_is_attributed_to_provider() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/completions");
                then.status(429)
                    .json_body(json!({"error": {"message": "Rate limit reached"}}));
            })
            .await;

        let provider = ExternalProvider::new(openai_config(server.url("/v1")));
        let err = provider
            .text_completion(CompletionParams {
                model: "gpt-3.5-turbo-instruct".to_string(),
                prompt: "Once upon".to_string(),
                max_tokens: 8,
                temperature: 1.0,
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::RateLimited);
        assert_eq!(err.provider_id, "openai");
        assert!(err.message.contains("Rate limit reached"));
    }
}
