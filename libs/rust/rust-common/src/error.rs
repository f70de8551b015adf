//! Error type for the platform libraries.

use thiserror::Error;

/// Failures raised by the key-value store.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Encrypting a value for storage, or decrypting it back, failed
    #[error("Encryption error: {0}")]
    Encryption(String),
}

impl PlatformError {
    /// Create an encryption error with the given message.
    #[must_use]
    pub fn encryption(msg: impl Into<String>) -> Self {
        Self::Encryption(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlatformError::encryption("aead::Error");
        assert_eq!(err.to_string(), "Encryption error: aead::Error");
    }
}
