#![allow(dead_code)]

use api::build_app;
use config::{DefaultParams, GatewayConfig};
use inference_providers::MockProvider;
use services::{
    models::ModelDescriptor, CompletionRouter, CompletionService, InferenceProviderPool,
    ModelRegistry,
};
use std::sync::Arc;

/// Test server plus handles on the mock providers behind it
pub struct TestContext {
    pub server: axum_test::TestServer,
    pub openai: Arc<MockProvider>,
    pub anthropic: Arc<MockProvider>,
}

/// `gpt-fast` on openai with anthropic as fallback, `gpt-solo` on openai only,
/// `claude` on anthropic
pub fn default_models() -> Vec<ModelDescriptor> {
    vec![
        ModelDescriptor::new(
            "gpt-fast",
            "openai",
            "gpt-4o-mini",
            DefaultParams {
                max_tokens: 256,
                temperature: 0.7,
            },
        )
        .with_fallback("anthropic")
        .with_fallback_model("claude-3-5-haiku-latest"),
        ModelDescriptor::new(
            "gpt-solo",
            "openai",
            "gpt-4o",
            DefaultParams {
                max_tokens: 512,
                temperature: 1.0,
            },
        ),
        ModelDescriptor::new(
            "claude",
            "anthropic",
            "claude-3-5-haiku-latest",
            DefaultParams::default(),
        ),
    ]
}

/// Setup a test server over the real router and mock adapters
pub fn setup_test_server() -> TestContext {
    setup_test_server_with_models(default_models())
}

pub fn setup_test_server_with_models(models: Vec<ModelDescriptor>) -> TestContext {
    init_test_tracing();

    let openai = Arc::new(MockProvider::new("openai"));
    let anthropic = Arc::new(MockProvider::new("anthropic"));

    let mut pool = InferenceProviderPool::new();
    pool.register_provider(openai.clone());
    pool.register_provider(anthropic.clone());

    let registry = ModelRegistry::new(models, &pool).expect("valid test registry");
    let router = CompletionRouter::new(Arc::new(registry), Arc::new(pool));

    TestContext {
        server: server_for(Arc::new(router)),
        openai,
        anthropic,
    }
}

/// Test server over any completion service (e.g. a mockall mock)
pub fn server_for(service: Arc<dyn CompletionService>) -> axum_test::TestServer {
    let app = build_app(service, &GatewayConfig::default());
    axum_test::TestServer::new(app).expect("test server starts")
}

fn init_test_tracing() {
    // Only the first call per test binary installs the subscriber
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::level_filters::LevelFilter::DEBUG)
        .try_init();
}

pub fn prompt_request(model: &str, prompt: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "prompt": prompt,
    })
}

pub fn chat_request(model: &str, content: &str) -> serde_json::Value {
    serde_json::json!({
        "model": model,
        "messages": [
            {
                "role": "user",
                "content": content
            }
        ]
    })
}
