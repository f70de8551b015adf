//! JWT claims carried by access and refresh tokens.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which slot a token was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token presented on every request
    Access,
    /// Long-lived token used only to mint a new pair
    Refresh,
}

impl TokenKind {
    /// Label used in logs and metrics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered claims plus the token kind.
///
/// `iat`, `jti` and `kind` are optional on the wire so that tokens minted
/// before they existed still deserialize; whether an untyped token is
/// accepted is decided at verification time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Expiration time (Unix seconds)
    pub exp: i64,
    /// Issued at (Unix seconds)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Unique token id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Access or refresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TokenKind>,
}

impl Claims {
    /// Claims for `subject` expiring `ttl_seconds` after `now`.
    pub fn new(subject: impl Into<String>, kind: TokenKind, now: i64, ttl_seconds: i64) -> Self {
        Self {
            sub: subject.into(),
            exp: now.saturating_add(ttl_seconds),
            iat: Some(now),
            jti: Some(Uuid::new_v4().to_string()),
            kind: Some(kind),
        }
    }

    /// Whether the token is past its expiry at `now`.
    ///
    /// A token whose `exp` equals `now` is already expired.
    pub const fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }

    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_new() {
        let claims = Claims::new("alice", TokenKind::Access, 1_000, 3600);

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iat, Some(1_000));
        assert_eq!(claims.exp, 4_600);
        assert_eq!(claims.kind, Some(TokenKind::Access));
        assert!(claims.jti.is_some());
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = Claims::new("alice", TokenKind::Access, 1_000, 10);

        assert!(!claims.is_expired_at(1_009));
        assert!(claims.is_expired_at(1_010));
        assert!(claims.is_expired_at(2_000));
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let claims = Claims::new("bob", TokenKind::Refresh, 0, 60);
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["kind"], "refresh");
        assert_eq!(json["sub"], "bob");
    }

    #[test]
    fn test_untyped_claims_deserialize() {
        let claims: Claims = serde_json::from_str(r#"{"sub":"carol","exp":42}"#).unwrap();

        assert_eq!(claims.kind, None);
        assert_eq!(claims.iat, None);
        assert_eq!(claims.exp, 42);
    }

    #[test]
    fn test_unique_jti() {
        let a = Claims::new("alice", TokenKind::Access, 0, 60);
        let b = Claims::new("alice", TokenKind::Access, 0, 60);
        assert_ne!(a.jti, b.jti);
    }
}
