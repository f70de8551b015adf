//! Lazily loaded, immutable ES256 key pair.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use once_cell::sync::OnceCell;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use tracing::{debug, info};

use super::assets::{AssetStore, PRIVATE_KEY_ASSET, PUBLIC_KEY_ASSET};
use crate::error::AuthError;

const PROBE: &[u8] = b"auth-token-service key pair probe";

/// Parsed signing and verification keys.
pub struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    /// Parse and cross-check a PEM key pair.
    ///
    /// The private key must be a PKCS#8 P-256 key and the public key must
    /// verify a signature produced by it.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyLoad`] naming the offending asset.
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, AuthError> {
        let private = pem::parse(private_pem)
            .map_err(|e| AuthError::key_load(PRIVATE_KEY_ASSET, format!("invalid PEM: {e}")))?;
        if private.tag() != "PRIVATE KEY" {
            return Err(AuthError::key_load(
                PRIVATE_KEY_ASSET,
                format!("expected PKCS#8 PRIVATE KEY, found {}", private.tag()),
            ));
        }
        EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, private.contents(), &SystemRandom::new())
            .map_err(|e| AuthError::key_load(PRIVATE_KEY_ASSET, format!("not a P-256 key: {e}")))?;

        let encoding = EncodingKey::from_ec_pem(private_pem)
            .map_err(|e| AuthError::key_load(PRIVATE_KEY_ASSET, e.to_string()))?;
        let decoding = DecodingKey::from_ec_pem(public_pem)
            .map_err(|e| AuthError::key_load(PUBLIC_KEY_ASSET, e.to_string()))?;

        let signature = jsonwebtoken::crypto::sign(PROBE, &encoding, Algorithm::ES256)
            .map_err(|e| AuthError::key_load(PRIVATE_KEY_ASSET, format!("probe signing failed: {e}")))?;
        let matches = jsonwebtoken::crypto::verify(&signature, PROBE, &decoding, Algorithm::ES256).unwrap_or(false);
        if !matches {
            return Err(AuthError::key_load(
                PUBLIC_KEY_ASSET,
                "public key does not match private key",
            ));
        }

        Ok(Self { encoding, decoding })
    }

    /// Private half.
    pub fn encoding(&self) -> &EncodingKey {
        &self.encoding
    }

    /// Public half.
    pub fn decoding(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").finish_non_exhaustive()
    }
}

/// Loads the key pair from an [`AssetStore`] on first use and caches it for
/// the provider's lifetime.
///
/// Concurrent first callers block on the same initialisation; only one of
/// them touches the asset store. A failed load is not cached, but callers
/// are expected to treat it as fatal rather than retry.
pub struct KeyProvider {
    assets: Box<dyn AssetStore>,
    keys: OnceCell<KeyPair>,
}

impl KeyProvider {
    /// Create a provider over the given asset store.
    pub fn new(assets: impl AssetStore + 'static) -> Self {
        Self {
            assets: Box::new(assets),
            keys: OnceCell::new(),
        }
    }

    /// Force loading now.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyLoad`] if the assets are missing or malformed.
    pub fn preload(&self) -> Result<(), AuthError> {
        self.key_pair().map(|_| ())
    }

    /// Private key used to sign tokens.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyLoad`] if the first load fails.
    pub fn signing_key(&self) -> Result<&EncodingKey, AuthError> {
        self.key_pair().map(KeyPair::encoding)
    }

    /// Public key used to verify tokens.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyLoad`] if the first load fails.
    pub fn verification_key(&self) -> Result<&DecodingKey, AuthError> {
        self.key_pair().map(KeyPair::decoding)
    }

    /// Whether the pair has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.keys.get().is_some()
    }

    fn key_pair(&self) -> Result<&KeyPair, AuthError> {
        self.keys.get_or_try_init(|| {
            debug!(source = %self.assets.describe(), "Loading signing key pair");
            let private = self.assets.load(PRIVATE_KEY_ASSET)?;
            let public = self.assets.load(PUBLIC_KEY_ASSET)?;
            let pair = KeyPair::from_pem(&private, &public)?;
            info!(source = %self.assets.describe(), algorithm = "ES256", "Signing key pair loaded");
            Ok(pair)
        })
    }
}

impl fmt::Debug for KeyProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyProvider")
            .field("source", &self.assets.describe())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{EmbeddedAssets, MemoryAssets};
    use std::borrow::Cow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const OTHER_PUBLIC: &[u8] = include_bytes!("../../tests/fixtures/other-key-pub.pem");
    const P384_PRIVATE: &[u8] = include_bytes!("../../tests/fixtures/p384-key-pri.pem");
    const P384_PUBLIC: &[u8] = include_bytes!("../../tests/fixtures/p384-key-pub.pem");

    struct CountingAssets {
        inner: EmbeddedAssets,
        loads: Arc<AtomicUsize>,
    }

    impl AssetStore for CountingAssets {
        fn load(&self, name: &str) -> Result<Cow<'static, [u8]>, AuthError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(name)
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn embedded(name: &str) -> Vec<u8> {
        EmbeddedAssets.load(name).unwrap().into_owned()
    }

    #[test]
    fn test_embedded_pair_loads() {
        let provider = KeyProvider::new(EmbeddedAssets);
        assert!(!provider.is_loaded());

        provider.preload().unwrap();
        assert!(provider.is_loaded());
        assert!(provider.signing_key().is_ok());
        assert!(provider.verification_key().is_ok());
    }

    #[test]
    fn test_loads_once_under_concurrency() {
        let loads = Arc::new(AtomicUsize::new(0));
        let provider = Arc::new(KeyProvider::new(CountingAssets {
            inner: EmbeddedAssets,
            loads: Arc::clone(&loads),
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let provider = Arc::clone(&provider);
                std::thread::spawn(move || provider.signing_key().is_ok())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
        provider.verification_key().unwrap();

        // one private + one public read
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_missing_asset_is_key_load_error() {
        let provider = KeyProvider::new(MemoryAssets::default());
        let err = provider.preload().unwrap_err();
        assert!(matches!(err, AuthError::KeyLoad { .. }));
        assert!(!provider.is_loaded());
    }

    #[test]
    fn test_malformed_pem_rejected() {
        let provider = KeyProvider::new(MemoryAssets::with_pair("not a pem", embedded(PUBLIC_KEY_ASSET)));
        let Err(err) = provider.signing_key() else {
            panic!("malformed private key accepted");
        };
        assert!(matches!(err, AuthError::KeyLoad { ref asset, .. } if asset == PRIVATE_KEY_ASSET));
    }

    #[test]
    fn test_wrong_curve_rejected() {
        let provider = KeyProvider::new(MemoryAssets::with_pair(P384_PRIVATE, P384_PUBLIC));
        let err = provider.preload().unwrap_err();
        assert!(matches!(err, AuthError::KeyLoad { ref asset, .. } if asset == PRIVATE_KEY_ASSET));
    }

    #[test]
    fn test_mismatched_pair_rejected() {
        let provider = KeyProvider::new(MemoryAssets::with_pair(embedded(PRIVATE_KEY_ASSET), OTHER_PUBLIC));
        let err = provider.preload().unwrap_err();
        assert!(matches!(err, AuthError::KeyLoad { ref asset, .. } if asset == PUBLIC_KEY_ASSET));
    }
}
