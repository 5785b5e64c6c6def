use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

/// Parameters for a prompt-style completion.
///
/// Every field is already resolved; adapters never apply defaults of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    /// Concrete model name at the provider
    pub model: String,
    pub prompt: String,
    pub max_tokens: i64,
    pub temperature: f32,
}

/// Parameters for a chat completion
#[derive(Debug, Clone, PartialEq)]
pub struct ChatCompletionParams {
    /// Concrete model name at the provider
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: i64,
    pub temperature: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub total_tokens: i32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: i32, completion_tokens: i32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Normalized result of one provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub text: String,
    /// Provider that actually served the request
    pub provider_id: String,
    pub concrete_model_name: String,
    pub usage: TokenUsage,
}

/// Failure classes shared by every adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// Caller requested a logical model the router does not know
    NotConfigured,
    /// Credential rejected by the provider
    Unauthorized,
    RateLimited,
    Upstream,
    Timeout,
}

impl ProviderErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderErrorKind::NotConfigured => "not_configured",
            ProviderErrorKind::Unauthorized => "unauthorized",
            ProviderErrorKind::RateLimited => "rate_limited",
            ProviderErrorKind::Upstream => "upstream",
            ProviderErrorKind::Timeout => "timeout",
        }
    }

    /// Transient failures may be retried once against a fallback provider
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProviderErrorKind::RateLimited | ProviderErrorKind::Upstream | ProviderErrorKind::Timeout
        )
    }

    /// Map an upstream HTTP status onto the taxonomy
    pub fn from_status(status_code: u16) -> Self {
        match status_code {
            401 | 403 => ProviderErrorKind::Unauthorized,
            408 | 504 => ProviderErrorKind::Timeout,
            429 => ProviderErrorKind::RateLimited,
            _ => ProviderErrorKind::Upstream,
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
#[error("{kind} error from provider '{provider_id}': {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    /// Provider the failing attempt was sent to; empty when no provider was selected
    pub provider_id: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(
        kind: ProviderErrorKind,
        provider_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            provider_id: provider_id.into(),
            message: message.into(),
        }
    }

    /// Error for a model name that resolves to nothing
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotConfigured, String::new(), message)
    }

    /// Attribute a backend failure to the provider that produced it
    pub fn from_backend(provider_id: &str, error: BackendError) -> Self {
        let kind = error.kind();
        let message = match error {
            BackendError::HttpError {
                status_code,
                message,
            } => format!("HTTP {status_code}: {message}"),
            BackendError::Timeout(message)
            | BackendError::Transport(message)
            | BackendError::InvalidResponse(message)
            | BackendError::InvalidCredentials(message) => message,
        };
        Self::new(kind, provider_id, message)
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Raw failure reported by a backend before it is attributed to a provider
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    #[error("HTTP {status_code}: {message}")]
    HttpError { status_code: u16, message: String },
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Failed to reach provider: {0}")]
    Transport(String),
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

impl BackendError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            BackendError::HttpError { status_code, .. } => {
                ProviderErrorKind::from_status(*status_code)
            }
            BackendError::Timeout(_) => ProviderErrorKind::Timeout,
            BackendError::Transport(_) | BackendError::InvalidResponse(_) => {
                ProviderErrorKind::Upstream
            }
            BackendError::InvalidCredentials(_) => ProviderErrorKind::Unauthorized,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BackendError::Timeout(e.to_string())
        } else if e.is_decode() {
            BackendError::InvalidResponse(e.to_string())
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}
