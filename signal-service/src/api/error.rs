use crate::types::SignalError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Any pipeline failure reaches clients as a plain 500
#[derive(Debug)]
pub struct ApiError(pub SignalError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);

        let body = ErrorBody {
            error: "internal_error".into(),
            message: self.0.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl From<SignalError> for ApiError {
    fn from(err: SignalError) -> Self {
        ApiError(err)
    }
}
