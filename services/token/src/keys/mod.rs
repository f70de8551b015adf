//! Signing key management.

pub mod assets;
pub mod provider;

pub use assets::{AssetStore, DirectoryAssets, EmbeddedAssets, MemoryAssets, PRIVATE_KEY_ASSET, PUBLIC_KEY_ASSET};
pub use provider::{KeyPair, KeyProvider};

use crate::config::Config;

/// Build the provider selected by configuration.
pub fn provider_from_config(config: &Config) -> KeyProvider {
    match &config.key_asset_dir {
        Some(dir) => KeyProvider::new(DirectoryAssets::new(dir)),
        None => KeyProvider::new(EmbeddedAssets),
    }
}
