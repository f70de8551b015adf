//! Credential records on top of the platform key-value store.

use std::future::Future;

use chrono::{DateTime, Utc};
use rust_common::{KvStore, KvStoreConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AuthError;

/// Stored credentials for one user. Never holds the plaintext password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Unique username
    pub username: String,
    /// Argon2id hash in PHC string format
    pub password_hash: String,
    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Record a freshly registered user.
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("username", &self.username)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Username-keyed credential storage with native async methods.
pub trait CredentialStore: Send + Sync {
    /// Look up a user.
    fn find(&self, username: &str) -> impl Future<Output = Result<Option<CredentialRecord>, AuthError>> + Send;

    /// Store `record` unless the username is taken.
    ///
    /// Returns `false` when a record already exists. Concurrent inserts for
    /// the same username produce exactly one `true`.
    fn insert_if_absent(&self, record: &CredentialRecord) -> impl Future<Output = Result<bool, AuthError>> + Send;
}

/// [`CredentialStore`] backed by [`KvStore`].
#[derive(Clone)]
pub struct KvCredentialStore {
    store: KvStore,
}

impl KvCredentialStore {
    /// Namespace credential records live under.
    pub const NAMESPACE: &'static str = "credentials";

    /// Create a store, optionally encrypting records at rest.
    pub fn new(encryption_key: Option<[u8; 32]>) -> Self {
        let mut config = KvStoreConfig::default().with_namespace(Self::NAMESPACE);
        if let Some(key) = encryption_key {
            config = config.with_encryption_key(key);
        }
        Self {
            store: KvStore::new(config),
        }
    }

    fn key(username: &str) -> String {
        format!("user:{username}")
    }
}

impl CredentialStore for KvCredentialStore {
    async fn find(&self, username: &str) -> Result<Option<CredentialRecord>, AuthError> {
        match self.store.get(&Self::key(username)).await? {
            Some(data) => {
                let record = serde_json::from_slice(&data)
                    .map_err(|e| AuthError::internal(format!("Deserialization failed: {e}")))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn insert_if_absent(&self, record: &CredentialRecord) -> Result<bool, AuthError> {
        let value = serde_json::to_vec(record)
            .map_err(|e| AuthError::internal(format!("Serialization failed: {e}")))?;

        let inserted = self
            .store
            .insert_if_absent(&Self::key(&record.username), &value)
            .await?;
        debug!(username = %record.username, inserted, "Credential insert");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = KvCredentialStore::new(None);
        let record = CredentialRecord::new("alice", "$argon2id$hash");

        assert!(store.insert_if_absent(&record).await.unwrap());
        assert_eq!(store.find("alice").await.unwrap(), Some(record));
        assert_eq!(store.find("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_insert_keeps_first() {
        let store = KvCredentialStore::new(None);
        let first = CredentialRecord::new("alice", "first");
        let second = CredentialRecord::new("alice", "second");

        assert!(store.insert_if_absent(&first).await.unwrap());
        assert!(!store.insert_if_absent(&second).await.unwrap());
        assert_eq!(store.find("alice").await.unwrap().unwrap().password_hash, "first");
    }

    #[tokio::test]
    async fn test_encrypted_records() {
        let store = KvCredentialStore::new(Some([7u8; 32]));
        let record = CredentialRecord::new("alice", "hash");

        store.insert_if_absent(&record).await.unwrap();
        assert_eq!(store.find("alice").await.unwrap(), Some(record));
    }

    #[test]
    fn test_debug_omits_hash() {
        let record = CredentialRecord::new("alice", "$argon2id$secret");
        assert!(!format!("{record:?}").contains("secret"));
    }
}
