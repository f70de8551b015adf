//! Centralized configuration for the token service.
//!
//! Values come from environment variables (optionally seeded from a `.env`
//! file) and are validated once at startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use base64::Engine as _;
use thiserror::Error;

/// Default access token lifetime: one hour.
pub const DEFAULT_ACCESS_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Default refresh token lifetime: 24 hours.
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// A lifetime or timeout was zero
    #[error("Invalid {0}: must be greater than 0")]
    ZeroDuration(&'static str),

    /// Access tokens must expire before the refresh tokens they pair with
    #[error("ACCESS_TOKEN_TTL ({access:?}) must be shorter than REFRESH_TOKEN_TTL ({refresh:?})")]
    TtlOrdering {
        /// Configured access lifetime
        access: Duration,
        /// Configured refresh lifetime
        refresh: Duration,
    },

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },
}

/// Token service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // Server settings
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Drain window after a shutdown signal
    pub shutdown_timeout: Duration,

    // Token settings
    /// Access token lifetime
    pub access_token_ttl: Duration,
    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
    /// Accept the `token access=".." refresh=".."` authorization header
    pub accept_legacy_scheme: bool,
    /// Accept tokens that carry no `kind` claim
    pub legacy_untyped_tokens: bool,

    // Key material
    /// Directory holding the PEM key pair; embedded assets when unset
    pub key_asset_dir: Option<PathBuf>,

    // Credential store
    /// Optional AES-256 key for credential records at rest
    pub store_encryption_key: Option<[u8; 32]>,

    // Logging
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(30),
            access_token_ttl: DEFAULT_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            accept_legacy_scheme: true,
            legacy_untyped_tokens: false,
            key_asset_dir: None,
            store_encryption_key: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or validation fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or validation fails.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            request_timeout: Duration::from_secs(parse_var(&lookup, "REQUEST_TIMEOUT", 30)?),
            shutdown_timeout: Duration::from_secs(parse_var(&lookup, "SHUTDOWN_TIMEOUT", 30)?),
            access_token_ttl: Duration::from_secs(parse_var(
                &lookup,
                "ACCESS_TOKEN_TTL",
                defaults.access_token_ttl.as_secs(),
            )?),
            refresh_token_ttl: Duration::from_secs(parse_var(
                &lookup,
                "REFRESH_TOKEN_TTL",
                defaults.refresh_token_ttl.as_secs(),
            )?),
            accept_legacy_scheme: parse_var(&lookup, "ACCEPT_LEGACY_SCHEME", defaults.accept_legacy_scheme)?,
            legacy_untyped_tokens: parse_var(&lookup, "LEGACY_UNTYPED_TOKENS", defaults.legacy_untyped_tokens)?,
            key_asset_dir: lookup("KEY_ASSET_DIR").filter(|s| !s.is_empty()).map(PathBuf::from),
            store_encryption_key: lookup("STORE_ENCRYPTION_KEY")
                .map(|raw| parse_encryption_key(&raw))
                .transpose()?,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: parse_var(&lookup, "LOG_JSON", defaults.log_json)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.access_token_ttl.is_zero() {
            return Err(ConfigError::ZeroDuration("ACCESS_TOKEN_TTL"));
        }
        if self.refresh_token_ttl.is_zero() {
            return Err(ConfigError::ZeroDuration("REFRESH_TOKEN_TTL"));
        }
        if self.access_token_ttl >= self.refresh_token_ttl {
            return Err(ConfigError::TtlOrdering {
                access: self.access_token_ttl,
                refresh: self.refresh_token_ttl,
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("REQUEST_TIMEOUT"));
        }
        if self.shutdown_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("SHUTDOWN_TIMEOUT"));
        }
        Ok(())
    }

    /// Socket address string to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Override token lifetimes.
    #[must_use]
    pub const fn with_token_ttls(mut self, access: Duration, refresh: Duration) -> Self {
        self.access_token_ttl = access;
        self.refresh_token_ttl = refresh;
        self
    }

    /// Toggle the legacy combined authorization header.
    #[must_use]
    pub const fn with_legacy_scheme(mut self, accept: bool) -> Self {
        self.accept_legacy_scheme = accept;
        self
    }

    /// Toggle acceptance of tokens without a `kind` claim.
    #[must_use]
    pub const fn with_legacy_untyped_tokens(mut self, accept: bool) -> Self {
        self.legacy_untyped_tokens = accept;
        self
    }

    /// Load key material from a directory instead of the embedded assets.
    #[must_use]
    pub fn with_key_asset_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.key_asset_dir = Some(dir.into());
        self
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_encryption_key(raw: &str) -> Result<[u8; 32], ConfigError> {
    let invalid = |reason: String| ConfigError::ParseError {
        name: "STORE_ENCRYPTION_KEY".to_string(),
        reason,
    };

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|e| invalid(e.to_string()))?;

    <[u8; 32]>::try_from(bytes.as_slice())
        .map_err(|_| invalid(format!("must be 32 bytes, got {}", bytes.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.access_token_ttl, Duration::from_secs(3600));
        assert_eq!(config.refresh_token_ttl, Duration::from_secs(86400));
        assert!(config.accept_legacy_scheme);
        assert!(!config.legacy_untyped_tokens);
        assert!(config.key_asset_dir.is_none());
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "9000"),
            ("ACCESS_TOKEN_TTL", "60"),
            ("REFRESH_TOKEN_TTL", "600"),
            ("ACCEPT_LEGACY_SCHEME", "false"),
            ("KEY_ASSET_DIR", "/etc/keys"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.access_token_ttl, Duration::from_secs(60));
        assert!(!config.accept_legacy_scheme);
        assert_eq!(config.key_asset_dir, Some(PathBuf::from("/etc/keys")));
        assert_eq!(config.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_access_ttl_must_be_shorter_than_refresh() {
        let result = Config::from_lookup(lookup_from(&[
            ("ACCESS_TOKEN_TTL", "7200"),
            ("REFRESH_TOKEN_TTL", "3600"),
        ]));
        assert!(matches!(result, Err(ConfigError::TtlOrdering { .. })));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("PORT", "0")])),
            Err(ConfigError::InvalidPort)
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("PORT", "not-a-port")])),
            Err(ConfigError::ParseError { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup_from(&[("ACCESS_TOKEN_TTL", "0")])),
            Err(ConfigError::ZeroDuration("ACCESS_TOKEN_TTL"))
        ));
    }

    #[test]
    fn test_encryption_key_parsing() {
        let key = base64::engine::general_purpose::STANDARD.encode([1u8; 32]);
        let config = Config::from_lookup(lookup_from(&[("STORE_ENCRYPTION_KEY", key.as_str())])).unwrap();
        assert_eq!(config.store_encryption_key, Some([1u8; 32]));

        let short = base64::engine::general_purpose::STANDARD.encode([1u8; 16]);
        assert!(Config::from_lookup(lookup_from(&[("STORE_ENCRYPTION_KEY", short.as_str())])).is_err());
    }
}
