//! Namespaced in-process key-value store.
//!
//! Backs record-oriented collaborators (credential records, for instance)
//! with namespace isolation, optional AES-GCM encryption at rest and an
//! atomic insert-if-absent primitive.

use crate::PlatformError;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const NONCE_LEN: usize = 12;

/// Key-value store configuration.
#[derive(Debug, Clone)]
pub struct KvStoreConfig {
    /// Namespace for key isolation
    pub namespace: String,
    /// Encryption key (32 bytes for AES-256)
    pub encryption_key: Option<[u8; 32]>,
}

impl Default for KvStoreConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            encryption_key: None,
        }
    }
}

impl KvStoreConfig {
    /// Create config with custom namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Create config with encryption enabled.
    #[must_use]
    pub const fn with_encryption_key(mut self, key: [u8; 32]) -> Self {
        self.encryption_key = Some(key);
        self
    }
}

/// In-process key-value store. Cheap to clone; clones share storage.
#[derive(Clone)]
pub struct KvStore {
    namespace: Arc<str>,
    entries: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    cipher: Option<Arc<Aes256Gcm>>,
}

impl KvStore {
    /// Create a new store.
    #[must_use]
    pub fn new(config: KvStoreConfig) -> Self {
        let cipher = config
            .encryption_key
            .map(|key| Arc::new(Aes256Gcm::new(&key.into())));

        Self {
            namespace: config.namespace.into(),
            entries: Arc::new(RwLock::new(HashMap::new())),
            cipher,
        }
    }

    /// Get a value.
    ///
    /// # Errors
    ///
    /// Returns an error if decryption fails.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PlatformError> {
        let namespaced_key = self.namespaced_key(key);
        let entries = self.entries.read().await;

        entries
            .get(&namespaced_key)
            .map(|value| self.decrypt(value))
            .transpose()
    }

    /// Insert a value only if no entry exists for `key`.
    ///
    /// The absence check and the insert happen under one write lock, so
    /// concurrent callers racing on the same key see exactly one `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    pub async fn insert_if_absent(&self, key: &str, value: &[u8]) -> Result<bool, PlatformError> {
        let namespaced_key = self.namespaced_key(key);
        let value = self.encrypt(value)?;

        let mut entries = self.entries.write().await;
        if entries.contains_key(&namespaced_key) {
            return Ok(false);
        }
        entries.insert(namespaced_key, value);

        Ok(true)
    }

    fn namespaced_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

/// Encrypt data using AES-GCM; the nonce is prepended to the ciphertext.
    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, PlatformError> {
        let Some(cipher) = self.cipher.as_deref() else {
            return Ok(data.to_vec());
        };

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, data)
            .map_err(|e| PlatformError::encryption(e.to_string()))?;

        let mut result = nonce_bytes.to_vec();
        result.extend(ciphertext);
        Ok(result)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, PlatformError> {
        let Some(cipher) = self.cipher.as_deref() else {
            return Ok(data.to_vec());
        };

        if data.len() < NONCE_LEN {
            return Err(PlatformError::encryption("Data too short for decryption"));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| PlatformError::encryption(e.to_string()))
    }
}
