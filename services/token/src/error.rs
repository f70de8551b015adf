//! Error taxonomy for the token service.
//!
//! Every failure is a typed [`AuthError`]. The HTTP boundary maps each one to
//! a status code through [`ErrorCode`], but the response body is always the
//! same `{"success": false}` so clients cannot tell which check failed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_common::PlatformError;
use thiserror::Error;
use tracing::{error, warn};

use crate::config::ConfigError;

/// Token service error.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthError {
    /// Signing key material could not be loaded; fatal at startup
    #[error("Key load failed for {asset}: {reason}")]
    KeyLoad {
        /// Asset name that failed
        asset: String,
        /// What went wrong
        reason: String,
    },

    /// Token structure, algorithm, kind or signature is invalid
    #[error("Token malformed: {reason}")]
    MalformedToken {
        /// Description of the malformation
        reason: String,
    },

    /// Token signature is valid but its expiry has passed
    #[error("Token expired at {expired_at}")]
    Expired {
        /// When the token expired
        expired_at: DateTime<Utc>,
    },

    /// No usable authorization header
    #[error("Credentials missing from request")]
    MissingCredentials,

    /// Unknown username at authentication
    #[error("User not found")]
    NotFound,

    /// Wrong password at authentication
    #[error("Password mismatch")]
    PasswordMismatch,

    /// Registration of an existing username
    #[error("User already exists")]
    DuplicateUser,

    /// Request body failed validation or decoding
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// Why the request was rejected
        reason: String,
    },

    /// Credential store failure
    #[error("Credential store error: {0}")]
    Store(#[from] PlatformError),

    /// Configuration failure
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Internal error (details never reach the client)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Create a key load error.
    pub fn key_load(asset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KeyLoad {
            asset: asset.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed token error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Create an internal error from a message.
    pub fn internal(message: impl std::fmt::Display) -> Self {
        Self::Internal(anyhow::anyhow!("{message}"))
    }

    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::KeyLoad { .. } => ErrorCode::KeyLoad,
            Self::MalformedToken { .. } => ErrorCode::MalformedToken,
            Self::Expired { .. } => ErrorCode::Expired,
            Self::MissingCredentials => ErrorCode::MissingCredentials,
            Self::NotFound => ErrorCode::NotFound,
            Self::PasswordMismatch => ErrorCode::PasswordMismatch,
            Self::DuplicateUser => ErrorCode::DuplicateUser,
            Self::InvalidRequest { .. } => ErrorCode::InvalidRequest,
            Self::Store(_) => ErrorCode::Store,
            Self::Config(_) | Self::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Whether this is the expiry failure that may trigger a refresh.
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }
}

/// Stable error codes for logs, metrics and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Signing key material missing or unusable
    KeyLoad,
    /// Token failed parsing, signature or kind checks
    MalformedToken,
    /// Correctly signed token past its expiry
    Expired,
    /// No usable credentials on the request
    MissingCredentials,
    /// Unknown username
    NotFound,
    /// Wrong password for a known username
    PasswordMismatch,
    /// Username already registered
    DuplicateUser,
    /// Request body missing or invalid
    InvalidRequest,
    /// Credential store failure
    Store,
    /// Unexpected server-side failure
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::KeyLoad => "KEY_LOAD_ERROR",
            Self::MalformedToken => "AUTH_TOKEN_MALFORMED",
            Self::Expired => "AUTH_TOKEN_EXPIRED",
            Self::MissingCredentials => "AUTH_CREDENTIALS_MISSING",
            Self::NotFound => "AUTH_USER_NOT_FOUND",
            Self::PasswordMismatch => "AUTH_PASSWORD_MISMATCH",
            Self::DuplicateUser => "AUTH_DUPLICATE_USER",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::Store => "STORE_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// HTTP status for this code.
    ///
    /// Unknown user and wrong password share a status with every other
    /// authentication failure.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MalformedToken
            | Self::Expired
            | Self::MissingCredentials
            | Self::NotFound
            | Self::PasswordMismatch => StatusCode::UNAUTHORIZED,
            Self::DuplicateUser => StatusCode::CONFLICT,
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::KeyLoad | Self::Store | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure originates from the client.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

/// Uniform failure body.
#[derive(Debug, serde::Serialize)]
struct FailureBody {
    success: bool,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let code = self.code();
        if code.is_client_error() {
            warn!(code = code.as_str(), error = %self, "Request rejected");
        } else {
            error!(code = code.as_str(), error = %self, "Request failed");
        }

        (code.status(), Json(FailureBody { success: false })).into_response()
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired {
                expired_at: Utc::now(),
            },
            ErrorKind::InvalidSignature => AuthError::malformed("signature mismatch"),
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName | ErrorKind::MissingAlgorithm => {
                AuthError::malformed("unexpected signing algorithm")
            }
            ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidKeyFormat => {
                AuthError::internal(format!("signing key rejected: {err}"))
            }
            ErrorKind::Base64(_) => AuthError::malformed("invalid base64 segment"),
            ErrorKind::Json(_) => AuthError::malformed("invalid JSON segment"),
            ErrorKind::Utf8(_) => AuthError::malformed("invalid UTF-8 segment"),
            _ => AuthError::malformed("token validation failed"),
        }
    }
}
