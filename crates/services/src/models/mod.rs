pub mod ports;

use std::collections::HashMap;

use config::ModelsConfig;
use inference_providers::ProviderError;
pub use ports::{DefaultParams, ModelDescriptor, RegistryError};

use crate::inference_provider_pool::InferenceProviderPool;

/// Logical model name -> descriptor.
///
/// Validated once at construction and immutable afterwards, so the router can
/// share it across requests without locking.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, ModelDescriptor>,
}

impl ModelRegistry {
    /// Build a registry, rejecting duplicate names and references to providers
    /// the pool does not hold
    pub fn new(
        descriptors: impl IntoIterator<Item = ModelDescriptor>,
        pool: &InferenceProviderPool,
    ) -> Result<Self, RegistryError> {
        let mut models = HashMap::new();

        for descriptor in descriptors {
            Self::check_providers(&descriptor, pool)?;

            if models.contains_key(&descriptor.logical_name) {
                return Err(RegistryError::DuplicateModel(descriptor.logical_name));
            }
            models.insert(descriptor.logical_name.clone(), descriptor);
        }

        tracing::info!(models = models.len(), "Model registry loaded");
        Ok(Self { models })
    }

    /// Build a registry from the `models` section of the config file
    pub fn from_config(
        config: &ModelsConfig,
        pool: &InferenceProviderPool,
    ) -> Result<Self, RegistryError> {
        let descriptors = config.iter().map(|named| ModelDescriptor {
            logical_name: named.name.clone(),
            provider_id: named.entry.provider.clone(),
            concrete_model_name: named.entry.model_name.clone(),
            default_params: named.entry.default_params,
            fallback_provider: named.entry.fallback_provider.clone(),
            fallback_model_name: named.entry.fallback_model_name.clone(),
        });
        Self::new(descriptors, pool)
    }

    fn check_providers(
        descriptor: &ModelDescriptor,
        pool: &InferenceProviderPool,
    ) -> Result<(), RegistryError> {
        if !pool.contains(&descriptor.provider_id) {
            return Err(RegistryError::UnknownProvider {
                model: descriptor.logical_name.clone(),
                provider: descriptor.provider_id.clone(),
            });
        }

        if let Some(fallback) = &descriptor.fallback_provider {
            if fallback == &descriptor.provider_id {
                return Err(RegistryError::InvalidFallback {
                    model: descriptor.logical_name.clone(),
                    provider: fallback.clone(),
                });
            }
            let (Some(primary), Some(secondary)) =
                (pool.get(&descriptor.provider_id), pool.get(fallback))
            else {
                return Err(RegistryError::UnknownProvider {
                    model: descriptor.logical_name.clone(),
                    provider: fallback.clone(),
                });
            };
            // The primary's model name only carries over within one backend type
            if descriptor.fallback_model_name.is_none()
                && primary.backend_type() != secondary.backend_type()
            {
                return Err(RegistryError::MissingFallbackModel {
                    model: descriptor.logical_name.clone(),
                    provider: fallback.clone(),
                });
            }
        }

        Ok(())
    }

    /// Look up a logical model; unknown names are `NotConfigured`
    pub fn resolve(&self, logical_name: &str) -> Result<&ModelDescriptor, ProviderError> {
        self.models.get(logical_name).ok_or_else(|| {
            ProviderError::not_configured(format!("Model '{logical_name}' is not configured"))
        })
    }

    /// All descriptors, sorted by logical name
    pub fn list(&self) -> Vec<&ModelDescriptor> {
        let mut models: Vec<_> = self.models.values().collect();
        models.sort_by(|a, b| a.logical_name.cmp(&b.logical_name));
        models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
