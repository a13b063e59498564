use super::error::ApiError;
use crate::service::SignalService;
use crate::types::Signal;
use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

/// GET /signal/latest/{identifier}
pub async fn latest_signal(
    State(service): State<Arc<SignalService>>,
    Path(identifier): Path<String>,
) -> Result<Json<Signal>, ApiError> {
    let signal = service.latest_signal(&identifier).await?;
    Ok(Json(signal))
}
