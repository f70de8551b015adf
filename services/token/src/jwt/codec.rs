//! Token issuance and verification.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use jsonwebtoken::{encode, Header};
use tracing::debug;

use super::claims::{Claims, TokenKind};
use super::token::{KindPolicy, Token, Validated, SIGNING_ALGORITHM};
use crate::config::Config;
use crate::error::AuthError;
use crate::keys::KeyProvider;
use crate::metrics;

/// A compact JWT together with the claims it was signed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    /// Compact serialization
    pub token: String,
    /// Claims encoded in `token`
    pub claims: Claims,
}

/// Access token plus the refresh token that can replace it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Short-lived access token
    pub access: SignedToken,
    /// Long-lived refresh token
    pub refresh: SignedToken,
}

/// Signs and verifies ES256 tokens with the provider's key pair.
#[derive(Debug)]
pub struct TokenCodec {
    keys: Arc<KeyProvider>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    kind_policy: KindPolicy,
}

impl TokenCodec {
    /// Create a codec using the configured lifetimes and kind policy.
    pub fn new(keys: Arc<KeyProvider>, config: &Config) -> Self {
        let kind_policy = if config.legacy_untyped_tokens {
            KindPolicy::AllowUntyped
        } else {
            KindPolicy::Strict
        };

        Self {
            keys,
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
            kind_policy,
        }
    }

    /// Key provider backing this codec.
    pub fn keys(&self) -> &KeyProvider {
        &self.keys
    }

    /// Configured lifetime for `kind`.
    pub const fn lifetime(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// Sign a token for `subject` valid for `ttl_seconds`.
    ///
    /// A negative lifetime produces an already-expired token.
    ///
    /// # Errors
    ///
    /// Returns `KeyLoad` if the signing key cannot be loaded and `Internal`
    /// if signing fails.
    pub fn issue(&self, subject: &str, kind: TokenKind, ttl_seconds: i64) -> Result<SignedToken, AuthError> {
        let claims = Claims::new(subject, kind, Utc::now().timestamp(), ttl_seconds);
        let key = self.keys.signing_key()?;

        let token = encode(&Header::new(SIGNING_ALGORITHM), &claims, key)
            .map_err(|e| AuthError::internal(format!("signing failed: {e}")))?;

        metrics::record_token_issued(kind);
        debug!(subject = %subject, kind = %kind, exp = claims.exp, "Token issued");

        Ok(SignedToken { token, claims })
    }

    /// Issue an access/refresh pair for `subject` with the configured lifetimes.
    ///
    /// # Errors
    ///
    /// Propagates any [`TokenCodec::issue`] failure.
    pub fn issue_pair(&self, subject: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(subject, TokenKind::Access, ttl_seconds(self.access_ttl))?,
            refresh: self.issue(subject, TokenKind::Refresh, ttl_seconds(self.refresh_ttl))?,
        })
    }

    /// Verify `raw` as a token of the `expected` kind and return its claims.
    ///
    /// # Errors
    ///
    /// `MalformedToken` for anything structurally wrong (algorithm,
    /// signature, kind), `Expired` for a correctly signed token past its
    /// expiry, `KeyLoad` if the verification key is unavailable.
    pub fn verify(&self, raw: &str, expected: TokenKind) -> Result<Claims, AuthError> {
        self.verify_token(raw, expected)?.into_claims()
    }

    /// Like [`TokenCodec::verify`], returning the validated token itself.
    ///
    /// # Errors
    ///
    /// See [`TokenCodec::verify`].
    pub fn verify_token(&self, raw: &str, expected: TokenKind) -> Result<Token<Validated>, AuthError> {
        let started = Instant::now();
        let result = self.run_pipeline(raw, expected);
        metrics::observe_verification(expected, started.elapsed(), &result);
        result
    }

    fn run_pipeline(&self, raw: &str, expected: TokenKind) -> Result<Token<Validated>, AuthError> {
        let key = self.keys.verification_key()?;
        Token::parse(raw)?
            .validate_signature(key)?
            .validate_claims(expected, self.kind_policy, Utc::now().timestamp())
    }
}

fn ttl_seconds(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::EmbeddedAssets;

    fn codec(config: &Config) -> TokenCodec {
        TokenCodec::new(Arc::new(KeyProvider::new(EmbeddedAssets)), config)
    }

    #[test]
    fn test_issue_then_verify() {
        let codec = codec(&Config::default());
        let issued = codec.issue("alice", TokenKind::Access, 60).unwrap();

        let claims = codec.verify(&issued.token, TokenKind::Access).unwrap();
        assert_eq!(claims, issued.claims);
        assert_eq!(claims.exp - claims.iat.unwrap(), 60);
    }

    #[test]
    fn test_negative_lifetime_is_expired() {
        let codec = codec(&Config::default());
        let issued = codec.issue("alice", TokenKind::Access, -1).unwrap();

        let err = codec.verify(&issued.token, TokenKind::Access).unwrap_err();
        assert!(err.is_expired());
    }

    #[test]
    fn test_pair_lifetimes() {
        let codec = codec(&Config::default());
        let pair = codec.issue_pair("alice").unwrap();

        let access = &pair.access.claims;
        let refresh = &pair.refresh.claims;
        assert_eq!(access.exp - access.iat.unwrap(), 3600);
        assert_eq!(refresh.exp - refresh.iat.unwrap(), 86400);
        assert_eq!(access.kind, Some(TokenKind::Access));
        assert_eq!(refresh.kind, Some(TokenKind::Refresh));
        assert_ne!(pair.access.token, pair.refresh.token);
    }

    #[test]
    fn test_refresh_token_rejected_as_access() {
        let codec = codec(&Config::default());
        let pair = codec.issue_pair("alice").unwrap();

        let err = codec.verify(&pair.refresh.token, TokenKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken { .. }));

        let err = codec.verify(&pair.access.token, TokenKind::Refresh).unwrap_err();
        assert!(matches!(err, AuthError::MalformedToken { .. }));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = codec(&Config::default());
        for raw in ["", "abc", "a.b.c", "eyJhbGciOiJFUzI1NiJ9.e30.AAAA"] {
            let err = codec.verify(raw, TokenKind::Access).unwrap_err();
            assert!(matches!(err, AuthError::MalformedToken { .. }), "{raw}: {err}");
        }
    }
}
