pub mod models;
pub mod openapi;
pub mod routes;

use crate::{
    openapi::ApiDoc,
    routes::{chat_completions, completions, health_check, list_models, AppState},
};
use axum::{
    body::Body,
    http::Request,
    routing::{get, post},
    Router,
};
use config::{ApiConfig, BackendKind, GatewayConfig, ProviderSettings};
use inference_providers::{
    ExternalProvider, ExternalProviderConfig, InferenceProvider, ProviderConfig,
};
use services::{
    models::RegistryError, CompletionRouter, CompletionService, InferenceProviderPool,
    ModelRegistry,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Reasons the service refuses to start
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Provider '{provider}' needs an API key in environment variable {env_var}")]
    MissingCredential { provider: String, env_var: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Translate a provider section of the config file into adapter configuration
pub fn provider_config(settings: &ProviderSettings) -> ProviderConfig {
    match settings.backend {
        BackendKind::OpenAiCompatible => ProviderConfig::OpenAiCompatible {
            base_url: settings.base_url.clone(),
            organization_id: settings.organization_id.clone(),
        },
        BackendKind::Anthropic => ProviderConfig::Anthropic {
            base_url: settings.base_url.clone(),
            version: settings.version.clone(),
        },
    }
}

/// Initialize one adapter per configured provider.
///
/// Credentials come from the environment variable each provider names;
/// `lookup_env` is `std::env::var` outside tests.
pub fn init_inference_providers<F>(
    config: &ApiConfig,
    lookup_env: F,
) -> Result<InferenceProviderPool, StartupError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut pool = InferenceProviderPool::new();

    for (provider_id, settings) in &config.providers {
        let api_key = lookup_env(&settings.api_key_env)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| StartupError::MissingCredential {
                provider: provider_id.clone(),
                env_var: settings.api_key_env.clone(),
            })?;

        let provider = ExternalProvider::new(ExternalProviderConfig {
            provider_id: provider_id.clone(),
            provider_config: provider_config(settings),
            api_key,
            timeout_seconds: settings.timeout_seconds,
        });

        tracing::info!(
            provider = %provider_id,
            backend = provider.backend_type(),
            base_url = %settings.base_url,
            timeout_seconds = settings.timeout_seconds,
            "Configured inference provider"
        );
        pool.register_provider(Arc::new(provider));
    }

    Ok(pool)
}

/// Validate the model mapping against the pool and build the router
pub fn init_completion_router(
    config: &ApiConfig,
    pool: InferenceProviderPool,
) -> Result<CompletionRouter, StartupError> {
    let registry = ModelRegistry::from_config(&config.models, &pool)?;
    Ok(CompletionRouter::new(Arc::new(registry), Arc::new(pool)))
}

/// Build the complete application router
pub fn build_app(completion_service: Arc<dyn CompletionService>, gateway: &GatewayConfig) -> Router {
    let app_state = AppState { completion_service };
    let tenant_header = gateway.tenant_header.clone();

    Router::new()
        .merge(build_completion_routes(app_state.clone()))
        .merge(build_health_routes(app_state))
        .merge(build_openapi_routes())
        .layer(
            TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
                // Set by the gateway after it authenticated the caller; never required here
                let tenant = request
                    .headers()
                    .get(tenant_header.as_str())
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    tenant = %tenant,
                )
            }),
        )
}

pub fn build_completion_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/v1/completions", post(completions))
        .route("/v1/chat/completions", post(chat_completions))
        .route("/v1/models", get(list_models))
        .with_state(app_state)
}

pub fn build_health_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .with_state(app_state)
}

pub fn build_openapi_routes() -> Router {
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { axum::Json(ApiDoc::openapi()) }),
    )
}
