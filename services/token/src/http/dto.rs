//! Request and response bodies.

use serde::{Deserialize, Serialize};

/// Username/password pair for registration and authentication.
///
/// Capitalised field names from older clients are accepted as aliases.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    /// Username
    #[serde(alias = "Username")]
    pub username: String,
    /// Plaintext password
    #[serde(alias = "Password")]
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Bare outcome.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuccessResponse {
    /// Whether the operation succeeded
    pub success: bool,
}

impl SuccessResponse {
    /// Successful outcome.
    pub const fn ok() -> Self {
        Self { success: true }
    }
}

/// Authentication outcome with the access token.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthenticationResponse {
    /// Whether the credentials were accepted
    pub success: bool,
    /// Access token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Outcome carrying a greeting.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    /// Whether the request succeeded
    pub success: bool,
    /// Greeting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MessageResponse {
    /// Successful greeting.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }
}

/// Liveness body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always `"ok"`
    pub status: String,
}
