//! Mock implementation of InferenceProvider for testing
//!
//! This module provides a scripted provider that answers without any network
//! access and records every call it receives, so routing and HTTP tests can
//! assert on exactly what reached each provider.

use crate::{
    ChatCompletionParams, ChatMessage, CompletionParams, CompletionResult, InferenceProvider,
    ProviderError, ProviderErrorKind, TokenUsage,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::{Mutex, RwLock};

/// One scripted answer
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    /// Succeed with this text
    Text(String),
    /// Fail with this error kind and message
    Fail(ProviderErrorKind, String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn fail(kind: ProviderErrorKind) -> Self {
        Self::Fail(kind, format!("mock {kind} failure"))
    }
}

/// Which operation a recorded call went through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOperation {
    Text,
    Chat,
}

/// Everything the mock saw for one call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: MockOperation,
    pub model: String,
    pub max_tokens: i64,
    pub temperature: f32,
    pub prompt: Option<String>,
    pub messages: Vec<ChatMessage>,
}

/// Mock inference provider
///
/// Replies are taken from a FIFO script first; once the script is exhausted
/// every call gets the default reply.
pub struct MockProvider {
    provider_id: String,
    backend_type: String,
    script: Mutex<VecDeque<MockReply>>,
    default_reply: RwLock<MockReply>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    /// Mock that always answers `"mock response from <provider_id>"`
    pub fn new(provider_id: impl Into<String>) -> Self {
        let provider_id = provider_id.into();
        let default_reply = MockReply::Text(format!("mock response from {provider_id}"));
        Self {
            provider_id,
            backend_type: "mock".to_string(),
            script: Mutex::new(VecDeque::new()),
            default_reply: RwLock::new(default_reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Mock whose every call fails with `kind`
    pub fn failing(provider_id: impl Into<String>, kind: ProviderErrorKind) -> Self {
        Self::new(provider_id).with_default_reply(MockReply::fail(kind))
    }

    /// Builder form of [`MockProvider::set_default_reply`]
    pub fn with_default_reply(self, reply: MockReply) -> Self {
        Self {
            default_reply: RwLock::new(reply),
            ..self
        }
    }

    /// Report a different backend type; all mocks default to `"mock"`
    pub fn with_backend_type(self, backend_type: impl Into<String>) -> Self {
        Self {
            backend_type: backend_type.into(),
            ..self
        }
    }

    /// Builder form of [`MockProvider::push_reply`]
    pub fn with_script(self, replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            ..self
        }
    }

    pub async fn set_default_reply(&self, reply: MockReply) {
        *self.default_reply.write().await = reply;
    }

    /// Queue a reply for the next unanswered call
    pub async fn push_reply(&self, reply: MockReply) {
        self.script.lock().await.push_back(reply);
    }

    /// Calls received so far, oldest first
    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    async fn next_reply(&self) -> MockReply {
        if let Some(reply) = self.script.lock().await.pop_front() {
            return reply;
        }
        self.default_reply.read().await.clone()
    }

    async fn answer(
        &self,
        call: RecordedCall,
        input_words: usize,
    ) -> Result<CompletionResult, ProviderError> {
        let model = call.model.clone();
        self.calls.lock().await.push(call);

        match self.next_reply().await {
            MockReply::Text(text) => {
                let output_words = text.split_whitespace().count();
                Ok(CompletionResult {
                    usage: TokenUsage::new(input_words as i32, output_words as i32),
                    text,
                    provider_id: self.provider_id.clone(),
                    concrete_model_name: model,
                })
            }
            MockReply::Fail(kind, message) => {
                Err(ProviderError::new(kind, self.provider_id.clone(), message))
            }
        }
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn backend_type(&self) -> &str {
        &self.backend_type
    }

    async fn text_completion(
        &self,
        params: CompletionParams,
    ) -> Result<CompletionResult, ProviderError> {
        let input_words = params.prompt.split_whitespace().count();
        let call = RecordedCall {
            operation: MockOperation::Text,
            model: params.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            prompt: Some(params.prompt),
            messages: Vec::new(),
        };
        self.answer(call, input_words).await
    }

    async fn chat_completion(
        &self,
        params: ChatCompletionParams,
    ) -> Result<CompletionResult, ProviderError> {
        let input_words = params
            .messages
            .iter()
            .map(|m| m.content.split_whitespace().count())
            .sum();
        let call = RecordedCall {
            operation: MockOperation::Chat,
            model: params.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            prompt: None,
            messages: params.messages,
        };
        self.answer(call, input_words).await
    }
}
