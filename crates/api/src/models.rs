use inference_providers::{ChatMessage, CompletionResult, MessageRole, ProviderError, TokenUsage};
use serde::{Deserialize, Serialize};
use services::completions::{CompletionInput, CompletionRequest as ServiceCompletionRequest};
use services::models::ModelDescriptor;
use utoipa::ToSchema;

pub use config::{MAX_TEMPERATURE, MIN_TEMPERATURE};

/// Which endpoint a body arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionEndpoint {
    /// `POST /v1/completions`, requires `prompt`
    Completions,
    /// `POST /v1/chat/completions`, requires `messages`
    ChatCompletions,
}

/// Request body for `/v1/completions`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompletionRequest {
    /// Logical model name
    pub model: String,
    pub prompt: Option<String>,
    /// Must be absent on this endpoint
    pub messages: Option<Vec<Message>>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f32>,
    /// Streaming is not supported; `true` is rejected
    pub stream: Option<bool>,
}

/// Request body for `/v1/chat/completions`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatCompletionRequest {
    /// Logical model name
    pub model: String,
    pub messages: Option<Vec<Message>>,
    /// Must be absent on this endpoint
    pub prompt: Option<String>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f32>,
    /// Streaming is not supported; `true` is rejected
    pub stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Message {
    /// One of `system`, `user`, `assistant`, `tool`
    pub role: String,
    pub content: String,
}

/// Fields shared by both request bodies, checked in one place
struct RawRequest {
    model: String,
    prompt: Option<String>,
    messages: Option<Vec<Message>>,
    max_tokens: Option<i64>,
    temperature: Option<f32>,
    stream: Option<bool>,
}

impl RawRequest {
    fn validate(self, endpoint: CompletionEndpoint) -> Result<ServiceCompletionRequest, String> {
        if self.model.trim().is_empty() {
            return Err("model is required".to_string());
        }

        if self.stream == Some(true) {
            return Err("stream is not supported".to_string());
        }

        if let Some(max_tokens) = self.max_tokens {
            if max_tokens < 1 {
                return Err("max_tokens must be at least 1".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
                return Err(format!(
                    "temperature must be between {MIN_TEMPERATURE} and {MAX_TEMPERATURE}"
                ));
            }
        }

        let input = match (endpoint, self.prompt, self.messages) {
            (_, Some(_), Some(_)) => {
                return Err("exactly one of prompt or messages must be provided".to_string())
            }
            (CompletionEndpoint::Completions, Some(prompt), None) => CompletionInput::Prompt(prompt),
            (CompletionEndpoint::Completions, None, _) => {
                return Err("prompt is required".to_string())
            }
            (CompletionEndpoint::ChatCompletions, None, Some(messages)) => {
                if messages.is_empty() {
                    return Err("messages must not be empty".to_string());
                }
                CompletionInput::Messages(
                    messages
                        .into_iter()
                        .map(Message::into_chat_message)
                        .collect::<Result<_, _>>()?,
                )
            }
            (CompletionEndpoint::ChatCompletions, _, None) => {
                return Err("messages is required".to_string())
            }
        };

        Ok(ServiceCompletionRequest {
            model: self.model,
            input,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        })
    }
}

impl Message {
    fn into_chat_message(self) -> Result<ChatMessage, String> {
        let role = match self.role.as_str() {
            "system" => MessageRole::System,
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            "tool" => MessageRole::Tool,
            other => return Err(format!("unsupported message role '{other}'")),
        };
        Ok(ChatMessage::new(role, self.content))
    }
}

impl CompletionRequest {
    /// Validate the body and convert it into a routing request
    pub fn into_service_request(self) -> Result<ServiceCompletionRequest, String> {
        RawRequest {
            model: self.model,
            prompt: self.prompt,
            messages: self.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: self.stream,
        }
        .validate(CompletionEndpoint::Completions)
    }
}

impl ChatCompletionRequest {
    /// Validate the body and convert it into a routing request
    pub fn into_service_request(self) -> Result<ServiceCompletionRequest, String> {
        RawRequest {
            model: self.model,
            prompt: self.prompt,
            messages: self.messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: self.stream,
        }
        .validate(CompletionEndpoint::ChatCompletions)
    }
}

/// Token accounting reported by the serving provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Usage {
    pub prompt_tokens: i32,
    pub completion_tokens: i32,
    pub total_tokens: i32,
}

impl From<TokenUsage> for Usage {
    fn from(usage: TokenUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// Successful completion, same shape for both endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CompletionResponse {
    pub text: String,
    pub usage: Usage,
    /// Logical model that was requested
    pub model: String,
    /// Provider that served the request
    pub provider: String,
}

impl CompletionResponse {
    pub fn from_result(model: String, result: CompletionResult) -> Self {
        Self {
            text: result.text,
            usage: result.usage.into(),
            model,
            provider: result.provider_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// `invalid_request`, `not_configured`, `unauthorized`, `rate_limited`, `upstream` or `timeout`
    pub kind: String,
    /// Provider whose failure is reported, when one was called
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ErrorResponse {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            kind: "invalid_request".to_string(),
            provider: None,
        }
    }
}

impl From<&ProviderError> for ErrorResponse {
    fn from(error: &ProviderError) -> Self {
        Self {
            error: error.message.clone(),
            kind: error.kind.as_str().to_string(),
            provider: (!error.provider_id.is_empty()).then(|| error.provider_id.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelDefaults {
    pub max_tokens: i64,
    pub temperature: f32,
}

/// A logical model clients may request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub provider: String,
    pub model_name: String,
    pub default_params: ModelDefaults,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_provider: Option<String>,
}

impl From<ModelDescriptor> for ModelInfo {
    fn from(descriptor: ModelDescriptor) -> Self {
        Self {
            id: descriptor.logical_name,
            object: "model".to_string(),
            provider: descriptor.provider_id,
            model_name: descriptor.concrete_model_name,
            default_params: ModelDefaults {
                max_tokens: descriptor.default_params.max_tokens,
                temperature: descriptor.default_params.temperature,
            },
            fallback_provider: descriptor.fallback_provider,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ModelsResponse {
    pub object: String,
    pub data: Vec<ModelInfo>,
}
