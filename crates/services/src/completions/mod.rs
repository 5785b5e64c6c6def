pub mod ports;

use crate::inference_provider_pool::{sanitize_error_message, InferenceProviderPool};
use crate::models::{ModelDescriptor, ModelRegistry};
use inference_providers::{
    ChatCompletionParams, CompletionParams, CompletionResult, ProviderError, ProviderErrorKind,
};
use std::sync::Arc;

pub use ports::*;

/// Routes requests for logical models to provider adapters.
///
/// Holds only shared immutable state, so one instance serves every request
/// concurrently.
#[derive(Clone)]
pub struct CompletionRouter {
    registry: Arc<ModelRegistry>,
    inference_provider_pool: Arc<InferenceProviderPool>,
}

impl CompletionRouter {
    pub fn new(registry: Arc<ModelRegistry>, inference_provider_pool: Arc<InferenceProviderPool>) -> Self {
        Self {
            registry,
            inference_provider_pool,
        }
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// One adapter call, no retries
    async fn invoke(
        &self,
        provider_id: &str,
        concrete_model_name: &str,
        input: &CompletionInput,
        params: InvocationParams,
    ) -> Result<CompletionResult, ProviderError> {
        let provider = self.inference_provider_pool.get(provider_id).ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::Upstream,
                provider_id,
                format!("Provider '{provider_id}' is not registered"),
            )
        })?;

        let result = match input {
            CompletionInput::Prompt(prompt) => {
                provider
                    .text_completion(CompletionParams {
                        model: concrete_model_name.to_string(),
                        prompt: prompt.clone(),
                        max_tokens: params.max_tokens,
                        temperature: params.temperature,
                    })
                    .await
            }
            CompletionInput::Messages(messages) => {
                provider
                    .chat_completion(ChatCompletionParams {
                        model: concrete_model_name.to_string(),
                        messages: messages.clone(),
                        max_tokens: params.max_tokens,
                        temperature: params.temperature,
                    })
                    .await
            }
        }?;

        Ok(CompletionResult {
            provider_id: provider_id.to_string(),
            ..result
        })
    }

    fn log_failure(descriptor: &ModelDescriptor, attempt: u32, error: &ProviderError) {
        if error.kind == ProviderErrorKind::Unauthorized {
            tracing::error!(
                alert = "credential_rejected",
                model = %descriptor.logical_name,
                provider = %error.provider_id,
                attempt,
                error = %error.message,
                "Provider rejected configured credentials"
            );
        } else {
            tracing::warn!(
                model = %descriptor.logical_name,
                provider = %error.provider_id,
                attempt,
                kind = %error.kind,
                error = %error.message,
                "Provider call failed"
            );
        }
    }

    /// Client-facing copy of an error with URLs and addresses redacted
    fn sanitized(error: ProviderError) -> ProviderError {
        ProviderError {
            message: sanitize_error_message(&error.message),
            ..error
        }
    }
}

#[async_trait::async_trait]
impl CompletionService for CompletionRouter {
    async fn route(&self, request: CompletionRequest) -> Result<CompletionResult, ProviderError> {
        let descriptor = self.registry.resolve(&request.model).inspect_err(|_| {
            tracing::info!(model = %request.model, "Request for unconfigured model");
        })?;

        let params = InvocationParams::merge(&request, &descriptor.default_params);

        tracing::debug!(
            model = %descriptor.logical_name,
            provider = %descriptor.provider_id,
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            "Dispatching completion"
        );

        let primary_error = match self
            .invoke(
                &descriptor.provider_id,
                &descriptor.concrete_model_name,
                &request.input,
                params,
            )
            .await
        {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };
        Self::log_failure(descriptor, 1, &primary_error);

        if !primary_error.is_transient() {
            return Err(Self::sanitized(primary_error));
        }
        let Some((fallback_provider, fallback_model)) = descriptor.fallback_target() else {
            return Err(Self::sanitized(primary_error));
        };

        tracing::info!(
            model = %descriptor.logical_name,
            from = %descriptor.provider_id,
            to = %fallback_provider,
            kind = %primary_error.kind,
            "Falling back to secondary provider"
        );

        match self
            .invoke(fallback_provider, fallback_model, &request.input, params)
            .await
        {
            Ok(result) => Ok(result),
            Err(fallback_error) => {
                Self::log_failure(descriptor, 2, &fallback_error);
                Err(Self::sanitized(fallback_error))
            }
        }
    }

    fn models(&self) -> Vec<ModelDescriptor> {
        self.registry.list().into_iter().cloned().collect()
    }
}
