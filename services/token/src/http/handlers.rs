//! Route handlers.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;

use super::dto::{AuthenticationResponse, CredentialsRequest, HealthResponse, MessageResponse, SuccessResponse};
use super::extract::Authorized;
use super::token_headers;
use crate::error::AuthError;
use crate::metrics;
use crate::state::AppState;

fn credentials(payload: Result<Json<CredentialsRequest>, JsonRejection>) -> Result<CredentialsRequest, AuthError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AuthError::invalid_request(rejection.body_text()))
}

/// `POST /registration`
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AuthError> {
    let request = credentials(payload)?;
    state.accounts.register(&request.username, &request.password).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// `POST /authentication`
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(HeaderMap, Json<AuthenticationResponse>), AuthError> {
    let request = credentials(payload)?;
    let pair = state.accounts.authenticate(&request.username, &request.password).await?;

    let headers = token_headers(&pair)?;
    Ok((
        headers,
        Json(AuthenticationResponse {
            success: true,
            token: Some(pair.access.token),
        }),
    ))
}

/// `GET /authorized_hello`
pub async fn authorized_hello(Authorized(auth): Authorized) -> Result<(HeaderMap, Json<MessageResponse>), AuthError> {
    let headers = match &auth.rotated {
        Some(pair) => token_headers(pair)?,
        None => HeaderMap::new(),
    };

    Ok((headers, Json(MessageResponse::ok(format!("Hello {}", auth.subject)))))
}

/// `GET /hello`
pub async fn hello() -> Json<MessageResponse> {
    Json(MessageResponse::ok("Hello World"))
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// `GET /metrics`
pub async fn prometheus_metrics() -> impl IntoResponse {
    ([(CONTENT_TYPE, "text/plain; version=0.0.4")], metrics::render())
}
