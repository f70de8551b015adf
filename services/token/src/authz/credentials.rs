//! Authorization header parsing.
//!
//! Two schemes are understood:
//!
//! - `Bearer <access>`: the standard scheme; carries no refresh token.
//! - `token access="<access>" refresh="<refresh>"`: the legacy combined
//!   scheme. Parameters may appear in any order, quotes are optional and
//!   `refresh` may be omitted.

use crate::error::AuthError;

/// Which header scheme carried the credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialScheme {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: token access=".." refresh=".."`
    Combined,
}

/// Tokens extracted from a request.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestCredentials {
    /// Scheme the header used
    pub scheme: CredentialScheme,
    /// Access token slot
    pub access: String,
    /// Refresh token slot, if the scheme provides one
    pub refresh: Option<String>,
}

impl std::fmt::Debug for RequestCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCredentials")
            .field("scheme", &self.scheme)
            .field("has_refresh", &self.refresh.is_some())
            .finish_non_exhaustive()
    }
}

impl RequestCredentials {
    /// Parse an `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` when the header is absent, uses an
    /// unknown scheme, or has an empty access slot. The combined scheme is
    /// treated as unknown unless `accept_legacy` is set.
    pub fn from_header(header: Option<&str>, accept_legacy: bool) -> Result<Self, AuthError> {
        let header = header.map(str::trim).filter(|h| !h.is_empty());
        let Some(header) = header else {
            return Err(AuthError::MissingCredentials);
        };

        let (scheme, rest) = header.split_once(char::is_whitespace).unwrap_or((header, ""));
        let rest = rest.trim();

        if scheme.eq_ignore_ascii_case("bearer") {
            return parse_bearer(rest);
        }
        if accept_legacy && scheme.eq_ignore_ascii_case("token") {
            return parse_combined(rest);
        }

        Err(AuthError::MissingCredentials)
    }
}

fn parse_bearer(rest: &str) -> Result<RequestCredentials, AuthError> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(AuthError::MissingCredentials);
    }

    Ok(RequestCredentials {
        scheme: CredentialScheme::Bearer,
        access: rest.to_string(),
        refresh: None,
    })
}

fn parse_combined(rest: &str) -> Result<RequestCredentials, AuthError> {
    let mut access = None;
    let mut refresh = None;

    for param in rest.split(|c: char| c.is_whitespace() || c == ',') {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim_matches('"');
        if value.is_empty() {
            continue;
        }
        match name {
            "access" => access = Some(value.to_string()),
            "refresh" => refresh = Some(value.to_string()),
            _ => {}
        }
    }

    let access = access.ok_or(AuthError::MissingCredentials)?;
    Ok(RequestCredentials {
        scheme: CredentialScheme::Combined,
        access,
        refresh,
    })
}
