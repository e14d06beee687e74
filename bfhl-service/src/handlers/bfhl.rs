//! `/bfhl` endpoints.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::models::{BfhlRequest, Envelope, RequestError, ResultData};
use crate::services::record_operation;
use crate::startup::AppState;

/// `GET /bfhl`: static operation code.
pub async fn operation_code() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "operation_code": 1 })))
}

/// `POST /bfhl`: validate the body, run the selected computation and wrap
/// the outcome in an [`Envelope`].
pub async fn process(State(state): State<AppState>, body: Bytes) -> Response {
    let official_email = state.config.official_email.as_str();

    match process_impl(&state, &body).await {
        Ok(data) => (
            StatusCode::OK,
            Json(Envelope::success(official_email, data)),
        )
            .into_response(),
        Err(err) => {
            let status = err.status_code();
            if status.is_server_error() {
                tracing::error!(error = %err, "Error details");
            } else {
                tracing::info!(error = %err, "Rejected request");
            }
            (status, Json(Envelope::failure(official_email, &err))).into_response()
        }
    }
}

/// Core of `POST /bfhl`, usable without the HTTP layer.
pub async fn process_impl(state: &AppState, body: &[u8]) -> Result<ResultData, AppError> {
    let request = match parse_body(body) {
        Ok(request) => request,
        Err(err) => {
            record_operation("invalid", "failure");
            return Err(err);
        }
    };

    let key = request.key();
    let result = state.dispatcher.dispatch(request).await;
    record_operation(key.as_str(), if result.is_ok() { "success" } else { "failure" });

    Ok(result?)
}

fn parse_body(body: &[u8]) -> Result<BfhlRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(RequestError::EmptyBody.into());
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Invalid JSON body: {}", e)))?;

    Ok(BfhlRequest::try_from(value)?)
}
