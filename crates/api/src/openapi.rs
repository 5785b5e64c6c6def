use crate::models::*;
use crate::routes::health::HealthResponse;
use utoipa::OpenApi;

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "MCP Completion Router",
        description = "Routes completion requests for logical model names to the configured upstream provider, with a single fallback when the provider is transiently unavailable.",
        version = "1.0.0",
        license(
            name = "MIT",
        )
    ),
    paths(
        crate::routes::completions::completions,
        crate::routes::completions::chat_completions,
        crate::routes::models::list_models,
        crate::routes::health::health_check,
    ),
    components(
        schemas(
            CompletionRequest, ChatCompletionRequest, Message,
            CompletionResponse, Usage, ErrorResponse,
            ModelsResponse, ModelInfo, ModelDefaults,
            HealthResponse,
        )
    ),
    tags(
        (name = "Completions", description = "Prompt completions"),
        (name = "Chat", description = "Chat completions"),
        (name = "Models", description = "Configured logical models"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
