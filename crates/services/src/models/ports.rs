pub use config::DefaultParams;

/// Everything the router needs to serve one logical model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    /// Name clients put in the `model` field
    pub logical_name: String,
    pub provider_id: String,
    /// Model name as the provider knows it
    pub concrete_model_name: String,
    pub default_params: DefaultParams,
    pub fallback_provider: Option<String>,
    /// Model to request from the fallback provider; `None` reuses `concrete_model_name`
    pub fallback_model_name: Option<String>,
}

impl ModelDescriptor {
    pub fn new(
        logical_name: impl Into<String>,
        provider_id: impl Into<String>,
        concrete_model_name: impl Into<String>,
        default_params: DefaultParams,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            provider_id: provider_id.into(),
            concrete_model_name: concrete_model_name.into(),
            default_params,
            fallback_provider: None,
            fallback_model_name: None,
        }
    }

    pub fn with_fallback(mut self, provider_id: impl Into<String>) -> Self {
        self.fallback_provider = Some(provider_id.into());
        self
    }

    pub fn with_fallback_model(mut self, model_name: impl Into<String>) -> Self {
        self.fallback_model_name = Some(model_name.into());
        self
    }

    /// Provider and concrete model for the fallback attempt, if one is declared
    pub fn fallback_target(&self) -> Option<(&str, &str)> {
        self.fallback_provider.as_deref().map(|provider| {
            (
                provider,
                self.fallback_model_name
                    .as_deref()
                    .unwrap_or(&self.concrete_model_name),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Model '{0}' is declared more than once")]
    DuplicateModel(String),
    #[error("Model '{model}' references unknown provider '{provider}'")]
    UnknownProvider { model: String, provider: String },
    #[error("Model '{model}' uses '{provider}' as both primary and fallback provider")]
    InvalidFallback { model: String, provider: String },
    #[error(
        "Model '{model}' falls back to '{provider}', which speaks a different API; set fallback_model_name"
    )]
    MissingFallbackModel { model: String, provider: String },
}
