//! Read-only asset stores holding the PEM-encoded signing key pair.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::AuthError;

/// Asset name of the PKCS#8 P-256 private key.
pub const PRIVATE_KEY_ASSET: &str = "ec256-key-pri.pem";

/// Asset name of the SPKI P-256 public key.
pub const PUBLIC_KEY_ASSET: &str = "ec256-key-pub.pem";

/// Source of bundled key material.
pub trait AssetStore: Send + Sync {
    /// Load the named asset.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::KeyLoad`] if the asset is missing or unreadable.
    fn load(&self, name: &str) -> Result<Cow<'static, [u8]>, AuthError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Key pair compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedAssets;

impl AssetStore for EmbeddedAssets {
    fn load(&self, name: &str) -> Result<Cow<'static, [u8]>, AuthError> {
        match name {
            PRIVATE_KEY_ASSET => Ok(Cow::Borrowed(include_bytes!("../../assets/ec256-key-pri.pem"))),
            PUBLIC_KEY_ASSET => Ok(Cow::Borrowed(include_bytes!("../../assets/ec256-key-pub.pem"))),
            other => Err(AuthError::key_load(other, "no such embedded asset")),
        }
    }

    fn describe(&self) -> String {
        "embedded".to_string()
    }
}

/// Key pair read from a deployment directory.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    /// Serve assets from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for DirectoryAssets {
    fn load(&self, name: &str) -> Result<Cow<'static, [u8]>, AuthError> {
        let path = self.root.join(name);
        std::fs::read(&path)
            .map(Cow::Owned)
            .map_err(|e| AuthError::key_load(name, format!("{}: {e}", path.display())))
    }

    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }
}

/// Assets held in memory; used to inject alternate key material.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssets {
    assets: HashMap<String, Vec<u8>>,
}

impl MemoryAssets {
    /// Create a store holding the given private/public PEM pair.
    pub fn with_pair(private_pem: impl Into<Vec<u8>>, public_pem: impl Into<Vec<u8>>) -> Self {
        Self::default()
            .with_asset(PRIVATE_KEY_ASSET, private_pem)
            .with_asset(PUBLIC_KEY_ASSET, public_pem)
    }

    /// Add or replace one asset.
    #[must_use]
    pub fn with_asset(mut self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.assets.insert(name.into(), bytes.into());
        self
    }
}

impl AssetStore for MemoryAssets {
    fn load(&self, name: &str) -> Result<Cow<'static, [u8]>, AuthError> {
        self.assets
            .get(name)
            .map(|bytes| Cow::Owned(bytes.clone()))
            .ok_or_else(|| AuthError::key_load(name, "asset not present"))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
