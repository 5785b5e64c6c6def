use crate::models::ErrorResponse;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use inference_providers::{ProviderError, ProviderErrorKind};

/// Map a provider failure class onto the HTTP status clients see
pub fn map_provider_error_to_status(kind: ProviderErrorKind) -> StatusCode {
    match kind {
        ProviderErrorKind::NotConfigured => StatusCode::NOT_FOUND,
        ProviderErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ProviderErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ProviderErrorKind::Upstream | ProviderErrorKind::Timeout => StatusCode::BAD_GATEWAY,
    }
}

/// Every error the HTTP layer can return
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidRequest(message) => (
                StatusCode::BAD_REQUEST,
                ResponseJson(ErrorResponse::invalid_request(message)),
            )
                .into_response(),
            ApiError::Provider(error) => (
                map_provider_error_to_status(error.kind),
                ResponseJson(ErrorResponse::from(&error)),
            )
                .into_response(),
        }
    }
}
