//! Authorization extractor for protected routes.

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::authz::Authorization;
use crate::error::AuthError;
use crate::state::AppState;

/// Resolves the request's `Authorization` header, refreshing if needed.
///
/// Rejects with the resolver's [`AuthError`], which renders as the uniform
/// failure body.
#[derive(Debug, Clone)]
pub struct Authorized(pub Authorization);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Authorized {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = match parts.headers.get(AUTHORIZATION) {
            Some(value) => Some(value.to_str().map_err(|_| AuthError::MissingCredentials)?),
            None => None,
        };

        state.resolver.resolve(header).map(Self)
    }
}
