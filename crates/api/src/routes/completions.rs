use crate::{
    models::*,
    routes::{common::ApiError, AppState},
};
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    response::Json as ResponseJson,
};
use services::completions::CompletionRequest as ServiceCompletionRequest;
use tracing::debug;

async fn route_request(
    app_state: &AppState,
    request: ServiceCompletionRequest,
) -> Result<ResponseJson<CompletionResponse>, ApiError> {
    let model = request.model.clone();
    let result = app_state.completion_service.route(request).await?;

    debug!(
        model = %model,
        provider = %result.provider_id,
        total_tokens = result.usage.total_tokens,
        "Completion served"
    );

    Ok(ResponseJson(CompletionResponse::from_result(model, result)))
}

/// Create a completion
///
/// Completes a single prompt with the provider configured for the logical model.
#[utoipa::path(
    post,
    path = "/v1/completions",
    tag = "Completions",
    request_body = CompletionRequest,
    responses(
        (status = 200, description = "Successful completion", body = CompletionResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Provider rejected credentials", body = ErrorResponse),
        (status = 404, description = "Model not configured", body = ErrorResponse),
        (status = 429, description = "Provider rate limited", body = ErrorResponse),
        (status = 502, description = "Provider failed or timed out", body = ErrorResponse)
    )
)]
pub async fn completions(
    State(app_state): State<AppState>,
    body: Result<Json<CompletionRequest>, JsonRejection>,
) -> Result<ResponseJson<CompletionResponse>, ApiError> {
    let Json(request) = body?;
    debug!(model = %request.model, "Completions request");

    let request = request
        .into_service_request()
        .map_err(ApiError::InvalidRequest)?;

    route_request(&app_state, request).await
}

/// Create a chat completion
///
/// Creates a completion for a given chat conversation.
#[utoipa::path(
    post,
    path = "/v1/chat/completions",
    tag = "Chat",
    request_body = ChatCompletionRequest,
    responses(
        (status = 200, description = "Successful completion", body = CompletionResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Provider rejected credentials", body = ErrorResponse),
        (status = 404, description = "Model not configured", body = ErrorResponse),
        (status = 429, description = "Provider rate limited", body = ErrorResponse),
        (status = 502, description = "Provider failed or timed out", body = ErrorResponse)
    )
)]
pub async fn chat_completions(
    State(app_state): State<AppState>,
    body: Result<Json<ChatCompletionRequest>, JsonRejection>,
) -> Result<ResponseJson<CompletionResponse>, ApiError> {
    let Json(request) = body?;
    debug!(
        model = %request.model,
        messages = request.messages.as_ref().map_or(0, Vec::len),
        "Chat completions request"
    );

    let request = request
        .into_service_request()
        .map_err(ApiError::InvalidRequest)?;

    route_request(&app_state, request).await
}
