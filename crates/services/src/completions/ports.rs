use async_trait::async_trait;
use inference_providers::{ChatMessage, CompletionResult, ProviderError};

#[cfg(any(test, feature = "test-mocks"))]
use mockall::automock;

use crate::models::{DefaultParams, ModelDescriptor};

/// What the caller wants completed: a bare prompt or a conversation
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionInput {
    Prompt(String),
    Messages(Vec<ChatMessage>),
}

// Request/Response models
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Logical model name
    pub model: String,
    pub input: CompletionInput,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            input: CompletionInput::Prompt(prompt.into()),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn chat(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            input: CompletionInput::Messages(messages),
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: i64) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Fully resolved sampling parameters handed to an adapter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvocationParams {
    pub max_tokens: i64,
    pub temperature: f32,
}

impl InvocationParams {
    /// Request values win; anything absent comes from the model defaults
    pub fn merge(request: &CompletionRequest, defaults: &DefaultParams) -> Self {
        Self {
            max_tokens: request.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: request.temperature.unwrap_or(defaults.temperature),
        }
    }
}

// Port/Trait definitions (no implementations!)

#[cfg_attr(any(test, feature = "test-mocks"), automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Resolve the logical model, invoke its provider and fall back once if allowed
    async fn route(&self, request: CompletionRequest) -> Result<CompletionResult, ProviderError>;

    /// Registered models, sorted by logical name
    fn models(&self) -> Vec<ModelDescriptor>;
}
