use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::warn;

pub const GENERIC_FAILURE: &str = "An error has occurred! Please try again. \
    If the service continues to have issues, please contact an OvO Admin.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not authorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Not authorized" })),
            )
                .into_response(),
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            AppError::Upstream(e) => {
                warn!("Upstream request failed due to: {:#}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": GENERIC_FAILURE })),
                )
                    .into_response()
            }
        }
    }
}
