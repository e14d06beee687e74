use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::models::Envelope;
use crate::startup::AppState;

/// Liveness probe: `{ is_success: true, official_email }`.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(Envelope::ok(state.config.official_email.as_str())),
    )
}

/// Readiness probe: the text provider must report itself usable.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.dispatcher.text_provider().health_check().await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Text provider not ready");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
