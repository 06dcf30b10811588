use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{AppState, error::AppError};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Rejects requests whose `x-api-key` does not match the configured key.
/// Without a configured key every request passes.
pub async fn api_key_guard(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_key.as_deref() else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok());

    if provided == Some(expected) {
        next.run(req).await
    } else {
        tracing::warn!("Rejected {} {}: invalid API key", req.method(), req.uri().path());
        AppError::Unauthorized.into_response()
    }
}
