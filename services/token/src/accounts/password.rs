//! Argon2id password hashing.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use rand::RngCore;

use crate::error::AuthError;

/// Hash used when the username is unknown, so that path costs the same as a
/// wrong password.
pub(super) static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| hash("dummy password for timing").ok());

/// Hash `password` with a fresh random salt.
///
/// # Errors
///
/// Returns `Internal` if salt encoding or hashing fails.
pub fn hash(password: &str) -> Result<String, AuthError> {
    let mut salt = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt);
    let salt = SaltString::encode_b64(&salt).map_err(|e| AuthError::internal(format!("salt encoding failed: {e}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::internal(format!("password hashing failed: {e}")))
}

/// Check `password` against a PHC hash string. An unparsable hash never
/// verifies.
pub fn verify(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}

/// Compute the dummy hash now instead of on the first unknown-user login.
///
/// Returns `false` if hashing failed, in which case [`verify_dummy`] is a
/// no-op.
pub fn prepare_dummy() -> bool {
    Lazy::force(&DUMMY_HASH).is_some()
}

/// Spend the same work as [`verify`] without a real hash.
pub fn verify_dummy(password: &str) {
    if let Some(dummy) = DUMMY_HASH.as_deref() {
        let _ = verify(password, dummy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let phc = hash("correct horse").unwrap();

        assert!(phc.starts_with("$argon2id$"));
        assert!(verify("correct horse", &phc));
        assert!(!verify("wrong horse", &phc));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash("same").unwrap(), hash("same").unwrap());
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!verify("anything", "not-a-phc-string"));
        assert!(!verify("", ""));
    }

    #[test]
    fn test_dummy_hash_available() {
        assert!(prepare_dummy());
        assert!(Lazy::get(&DUMMY_HASH).is_some_and(Option::is_some));
        verify_dummy("whatever");
    }
}
