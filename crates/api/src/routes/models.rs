use crate::{models::*, routes::AppState};
use axum::{extract::State, response::Json as ResponseJson};

/// List models
///
/// Lists the logical models this router serves, with their provider and fallback.
#[utoipa::path(
    get,
    path = "/v1/models",
    tag = "Models",
    responses(
        (status = 200, description = "Configured models", body = ModelsResponse)
    )
)]
pub async fn list_models(State(app_state): State<AppState>) -> ResponseJson<ModelsResponse> {
    ResponseJson(ModelsResponse {
        object: "list".to_string(),
        data: app_state
            .completion_service
            .models()
            .into_iter()
            .map(ModelInfo::from)
            .collect(),
    })
}
