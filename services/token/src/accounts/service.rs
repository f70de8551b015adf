//! Registration and authentication.

use std::sync::Arc;

use tracing::{info, warn};

use super::password;
use crate::error::AuthError;
use crate::jwt::{TokenCodec, TokenPair};
use crate::metrics;
use crate::storage::{CredentialRecord, CredentialStore, KvCredentialStore};

/// Registers users and exchanges credentials for token pairs.
#[derive(Clone)]
pub struct AccountService<S = KvCredentialStore> {
    store: S,
    codec: Arc<TokenCodec>,
}

impl<S: CredentialStore> AccountService<S> {
    /// Create a service over `store`.
    ///
    /// Computes the unknown-user dummy hash up front so the first failed
    /// login for a missing user costs no more than a wrong password.
    pub fn new(store: S, codec: Arc<TokenCodec>) -> Self {
        if !password::prepare_dummy() {
            warn!("Dummy password hash unavailable; unknown-user logins are not time-padded");
        }
        Self { store, codec }
    }

    /// Register `username` with `password`.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for an empty username or password, `DuplicateUser`
    /// if the name is taken, `Store`/`Internal` on backend failure.
    pub async fn register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let result = self.try_register(username, password).await;
        metrics::record_account_operation("register", status_label(&result));
        result
    }

    /// Verify credentials and issue a fresh token pair.
    ///
    /// Unknown users and wrong passwords are indistinguishable to callers
    /// at the HTTP boundary; internally they remain distinct errors.
    ///
    /// # Errors
    ///
    /// `NotFound`, `PasswordMismatch`, or a store/signing failure.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let result = self.try_authenticate(username, password).await;
        metrics::record_account_operation("authenticate", status_label(&result));
        result
    }

    async fn try_register(&self, username: &str, password: &str) -> Result<(), AuthError> {
        if username.is_empty() {
            return Err(AuthError::invalid_request("username must not be empty"));
        }
        if password.is_empty() {
            return Err(AuthError::invalid_request("password must not be empty"));
        }

        let plain = password.to_owned();
        let password_hash = tokio::task::spawn_blocking(move || password::hash(&plain))
            .await
            .map_err(|e| AuthError::internal(format!("hashing task failed: {e}")))??;

        let record = CredentialRecord::new(username, password_hash);
        if !self.store.insert_if_absent(&record).await? {
            warn!(username = %username, "Registration rejected: username taken");
            return Err(AuthError::DuplicateUser);
        }

        info!(username = %username, "User registered");
        Ok(())
    }

    async fn try_authenticate(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let record = self.store.find(username).await?;

        let plain = password.to_owned();
        let stored_hash = record.as_ref().map(|r| r.password_hash.clone());
        let verified = tokio::task::spawn_blocking(move || match stored_hash {
            Some(phc) => password::verify(&plain, &phc),
            None => {
                password::verify_dummy(&plain);
                false
            }
        })
        .await
        .map_err(|e| AuthError::internal(format!("verification task failed: {e}")))?;

        match (record, verified) {
            (None, _) => {
                warn!(username = %username, "Authentication failed: unknown user");
                Err(AuthError::NotFound)
            }
            (Some(_), false) => {
                warn!(username = %username, "Authentication failed: password mismatch");
                Err(AuthError::PasswordMismatch)
            }
            (Some(record), true) => {
                let pair = self.codec.issue_pair(&record.username)?;
                info!(username = %record.username, "User authenticated");
                Ok(pair)
            }
        }
    }
}

fn status_label<T>(result: &Result<T, AuthError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(AuthError::DuplicateUser) => "duplicate",
        Err(AuthError::NotFound | AuthError::PasswordMismatch) => "denied",
        Err(AuthError::InvalidRequest { .. }) => "invalid",
        Err(_) => "error",
    }
}
