//! HTTP surface.

pub mod dto;
pub mod extract;
pub mod handlers;

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::routing::{get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::AuthError;
use crate::jwt::TokenPair;
use crate::state::AppState;

/// Response header carrying a newly issued access token.
pub const SET_ACCESS_TOKEN: HeaderName = HeaderName::from_static("set-accesstoken");

/// Response header carrying a newly issued refresh token.
pub const SET_REFRESH_TOKEN: HeaderName = HeaderName::from_static("set-refreshtoken");

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let request_timeout = state.config.request_timeout;

    Router::new()
        .route("/registration", post(handlers::register))
        .route("/authentication", post(handlers::authenticate))
        .route("/authorized_hello", get(handlers::authorized_hello))
        .route("/hello", get(handlers::hello))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::prometheus_metrics))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `Set-AccessToken` / `Set-RefreshToken` headers for `pair`.
///
/// # Errors
///
/// Returns `Internal` if a token is not a valid header value.
pub fn token_headers(pair: &TokenPair) -> Result<HeaderMap, AuthError> {
    let value = |token: &str| {
        HeaderValue::from_str(token).map_err(|e| AuthError::internal(format!("token is not a header value: {e}")))
    };

    let mut headers = HeaderMap::new();
    headers.insert(SET_ACCESS_TOKEN, value(&pair.access.token)?);
    headers.insert(SET_REFRESH_TOKEN, value(&pair.refresh.token)?);
    Ok(headers)
}
