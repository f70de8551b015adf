//! Token Service library.
//!
//! Provides ES256 access/refresh token issuance and verification, request
//! authorization with transparent refresh, and password-based registration
//! and authentication over HTTP.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accounts;
pub mod authz;
pub mod config;
pub mod error;
pub mod http;
pub mod jwt;
pub mod keys;
pub mod metrics;
pub mod shutdown;
pub mod state;
pub mod storage;

// Re-exports for convenience
pub use config::Config;
pub use error::AuthError;
pub use state::AppState;
