use inference_providers::InferenceProvider;
use regex::Regex;
use std::{
    collections::HashMap,
    sync::{Arc, LazyLock},
};

type InferenceProviderTrait = dyn InferenceProvider + Send + Sync;

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s)]+").expect("URL pattern is valid"));
static IP_PORT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}:\d+\b").expect("IP:port pattern is valid")
});
static IP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("IP pattern is valid")
});

/// Map of provider id -> adapter.
///
/// Built once at start-up and shared read-only behind an `Arc`; lookups never
/// lock.
#[derive(Clone, Default)]
pub struct InferenceProviderPool {
    providers: HashMap<String, Arc<InferenceProviderTrait>>,
}

impl InferenceProviderPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own `provider_id`, replacing any previous one
    pub fn register_provider(&mut self, provider: Arc<InferenceProviderTrait>) {
        let provider_id = provider.provider_id().to_string();
        if self.providers.insert(provider_id.clone(), provider).is_some() {
            tracing::warn!(provider = %provider_id, "Replaced previously registered provider");
        } else {
            tracing::debug!(provider = %provider_id, "Registered provider");
        }
    }

    /// Register multiple providers at once (useful for testing)
    pub fn with_providers(providers: impl IntoIterator<Item = Arc<InferenceProviderTrait>>) -> Self {
        let mut pool = Self::new();
        for provider in providers {
            pool.register_provider(provider);
        }
        pool
    }

    pub fn get(&self, provider_id: &str) -> Option<Arc<InferenceProviderTrait>> {
        self.providers.get(provider_id).cloned()
    }

    pub fn contains(&self, provider_id: &str) -> bool {
        self.providers.contains_key(provider_id)
    }

    /// Registered provider ids, sorted
    pub fn provider_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Sanitize error message by removing sensitive information like IP addresses, URLs, and internal details
pub fn sanitize_error_message(error: &str) -> String {
    // Remove URLs (http://..., https://...)
    let sanitized = URL_REGEX.replace_all(error, "[URL_REDACTED]");

    // Remove standalone IP addresses with ports (e.g., 192.168.0.1:8000)
    let sanitized = IP_PORT_REGEX.replace_all(&sanitized, "[IP_REDACTED]");

    // Remove standalone IP addresses (e.g., 192.168.0.1)
    let sanitized = IP_REGEX.replace_all(&sanitized, "[IP_REDACTED]");

    // Remove specific error details that might leak internal structure
    sanitized.replace(
        "error sending request for url",
        "provider connection failed",
    )
}
