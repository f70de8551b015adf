//! Refresh protocol tests: rotation and failure propagation.

use std::sync::Arc;

use auth_token::authz::{AuthorizationResolver, CredentialScheme, RequestCredentials};
use auth_token::config::Config;
use auth_token::jwt::{TokenCodec, TokenKind};
use auth_token::keys::{EmbeddedAssets, KeyProvider};
use auth_token::AuthError;

fn setup(config: &Config) -> (Arc<TokenCodec>, AuthorizationResolver) {
    let codec = Arc::new(TokenCodec::new(Arc::new(KeyProvider::new(EmbeddedAssets)), config));
    let resolver = AuthorizationResolver::new(Arc::clone(&codec), config.accept_legacy_scheme);
    (codec, resolver)
}

fn combined(access: &str, refresh: &str) -> String {
    format!(r#"token access="{access}" refresh="{refresh}""#)
}

#[test]
fn test_rotation_issues_fresh_pair_with_configured_lifetimes() {
    let (codec, resolver) = setup(&Config::default());
    let access = codec.issue("alice", TokenKind::Access, -1).unwrap();
    let refresh = codec.issue("alice", TokenKind::Refresh, 3600).unwrap();

    let auth = resolver.resolve(Some(&combined(&access.token, &refresh.token))).unwrap();
    let pair = auth.rotated.expect("pair rotated");

    let new_access = codec.verify(&pair.access.token, TokenKind::Access).unwrap();
    let new_refresh = codec.verify(&pair.refresh.token, TokenKind::Refresh).unwrap();

    assert_eq!(new_access.sub, "alice");
    assert_eq!(new_refresh.sub, "alice");
    assert_eq!(new_access.exp - new_access.iat.unwrap(), 3600);
    assert_eq!(new_refresh.exp - new_refresh.iat.unwrap(), 86_400);
    assert_ne!(pair.refresh.token, refresh.token);
}

#[test]
fn test_rotated_access_token_authorizes_next_request() {
    let (codec, resolver) = setup(&Config::default());
    let access = codec.issue("alice", TokenKind::Access, -1).unwrap();
    let refresh = codec.issue("alice", TokenKind::Refresh, 3600).unwrap();

    let pair = resolver
        .resolve(Some(&combined(&access.token, &refresh.token)))
        .unwrap()
        .rotated
        .unwrap();

    let next = resolver
        .resolve(Some(&format!("Bearer {}", pair.access.token)))
        .unwrap();
    assert_eq!(next.subject, "alice");
    assert!(!next.was_rotated());
}

#[test]
fn test_valid_access_token_is_not_rotated() {
    let (codec, resolver) = setup(&Config::default());
    let pair = codec.issue_pair("alice").unwrap();

    let auth = resolver
        .resolve(Some(&combined(&pair.access.token, &pair.refresh.token)))
        .unwrap();
    assert!(auth.rotated.is_none());
}

#[test]
fn test_refresh_failures_propagate() {
    let (codec, resolver) = setup(&Config::default());
    let expired_access = codec.issue("alice", TokenKind::Access, -1).unwrap();
    let expired_refresh = codec.issue("alice", TokenKind::Refresh, -1).unwrap();
    let valid_access = codec.issue("alice", TokenKind::Access, 3600).unwrap();

    // expired refresh
    let err = resolver
        .resolve(Some(&combined(&expired_access.token, &expired_refresh.token)))
        .unwrap_err();
    assert!(err.is_expired());

    // garbage refresh
    let err = resolver
        .resolve(Some(&combined(&expired_access.token, "not-a-token")))
        .unwrap_err();
    assert!(matches!(err, AuthError::MalformedToken { .. }));

    // access token presented as refresh
    let err = resolver
        .resolve(Some(&combined(&expired_access.token, &valid_access.token)))
        .unwrap_err();
    assert!(matches!(err, AuthError::MalformedToken { .. }));
}

#[test]
fn test_expired_bearer_cannot_refresh() {
    let (codec, resolver) = setup(&Config::default());
    let access = codec.issue("alice", TokenKind::Access, -1).unwrap();

    let err = resolver
        .resolve(Some(&format!("Bearer {}", access.token)))
        .unwrap_err();
    assert!(err.is_expired());
}

#[test]
fn test_malformed_access_token_skips_refresh() {
    let (codec, resolver) = setup(&Config::default());
    let refresh = codec.issue("alice", TokenKind::Refresh, 3600).unwrap();

    // a refresh token in the access slot is a kind mismatch, not an expiry
    let err = resolver
        .resolve(Some(&combined(&refresh.token, &refresh.token)))
        .unwrap_err();
    assert!(matches!(err, AuthError::MalformedToken { .. }));
}

#[test]
fn test_legacy_scheme_disabled() {
    let config = Config::default().with_legacy_scheme(false);
    let (codec, resolver) = setup(&config);
    let pair = codec.issue_pair("alice").unwrap();

    let err = resolver
        .resolve(Some(&combined(&pair.access.token, &pair.refresh.token)))
        .unwrap_err();
    assert!(matches!(err, AuthError::MissingCredentials));

    assert!(resolver.resolve(Some(&format!("Bearer {}", pair.access.token))).is_ok());
}

#[test]
fn test_resolve_parsed_credentials() {
    let (codec, resolver) = setup(&Config::default());
    let access = codec.issue("alice", TokenKind::Access, -1).unwrap();
    let refresh = codec.issue("alice", TokenKind::Refresh, 3600).unwrap();

    let credentials = RequestCredentials::from_header(
        Some(&format!(r#"token refresh="{}" access="{}""#, refresh.token, access.token)),
        true,
    )
    .unwrap();
    assert_eq!(credentials.scheme, CredentialScheme::Combined);

    let auth = resolver.resolve_credentials(&credentials).unwrap();
    assert!(auth.was_rotated());
}
