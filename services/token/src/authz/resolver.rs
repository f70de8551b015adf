//! Authorization decision with transparent refresh.

use std::sync::Arc;

use tracing::{debug, info};

use super::credentials::RequestCredentials;
use crate::error::AuthError;
use crate::jwt::{Claims, TokenCodec, TokenKind, TokenPair};
use crate::metrics;

/// Outcome of a successful authorization.
#[derive(Debug, Clone)]
pub struct Authorization {
    /// Authenticated username
    pub subject: String,
    /// Claims of the token the decision rests on
    pub claims: Claims,
    /// Replacement pair, present when the access token had expired and the
    /// refresh token was used
    pub rotated: Option<TokenPair>,
}

impl Authorization {
    /// Whether a new pair was minted for this request.
    pub const fn was_rotated(&self) -> bool {
        self.rotated.is_some()
    }
}

/// Decides whether a request's credentials authorize it.
///
/// 1. Verify the access token. Success authorizes the request.
/// 2. Any failure other than expiry rejects it.
/// 3. An expired access token with no refresh slot rejects it with the
///    expiry error.
/// 4. Otherwise verify the refresh token; on failure reject with that error,
///    on success mint a new pair for the refresh token's subject.
#[derive(Debug, Clone)]
pub struct AuthorizationResolver {
    codec: Arc<TokenCodec>,
    accept_legacy_scheme: bool,
}

impl AuthorizationResolver {
    /// Create a resolver.
    pub const fn new(codec: Arc<TokenCodec>, accept_legacy_scheme: bool) -> Self {
        Self {
            codec,
            accept_legacy_scheme,
        }
    }

    /// Resolve a raw `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the decision chain.
    pub fn resolve(&self, header: Option<&str>) -> Result<Authorization, AuthError> {
        let result = RequestCredentials::from_header(header, self.accept_legacy_scheme)
            .and_then(|credentials| self.resolve_credentials(&credentials));

        let outcome = match &result {
            Ok(auth) if auth.was_rotated() => "refreshed",
            Ok(_) => "granted",
            Err(_) => "rejected",
        };
        metrics::record_authorization(outcome);
        result
    }

    /// Resolve already-parsed credentials.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the decision chain.
    pub fn resolve_credentials(&self, credentials: &RequestCredentials) -> Result<Authorization, AuthError> {
        let expired = match self.codec.verify(&credentials.access, TokenKind::Access) {
            Ok(claims) => {
                return Ok(Authorization {
                    subject: claims.sub.clone(),
                    claims,
                    rotated: None,
                });
            }
            Err(err) if err.is_expired() => err,
            Err(err) => {
                debug!(error = %err, "Access token rejected");
                return Err(err);
            }
        };

        let Some(refresh) = credentials.refresh.as_deref() else {
            debug!("Access token expired and no refresh token supplied");
            return Err(expired);
        };

        let claims = self.codec.verify(refresh, TokenKind::Refresh).inspect_err(|err| {
            metrics::record_refresh(false);
            debug!(error = %err, "Refresh token rejected");
        })?;

        let pair = self.codec.issue_pair(&claims.sub).inspect_err(|_| metrics::record_refresh(false))?;
        metrics::record_refresh(true);
        info!(subject = %claims.sub, "Token pair rotated from refresh token");

        Ok(Authorization {
            subject: claims.sub.clone(),
            claims: pair.access.claims.clone(),
            rotated: Some(pair),
        })
    }
}
