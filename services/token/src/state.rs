//! Shared application state.

use std::sync::Arc;

use crate::accounts::AccountService;
use crate::authz::AuthorizationResolver;
use crate::config::Config;
use crate::jwt::TokenCodec;
use crate::keys::{self, KeyProvider};
use crate::storage::KvCredentialStore;

/// Everything a request handler needs; shared behind an `Arc`.
pub struct AppState {
    /// Validated configuration
    pub config: Config,
    /// Token signing and verification
    pub codec: Arc<TokenCodec>,
    /// Authorization decisions for protected routes
    pub resolver: AuthorizationResolver,
    /// Registration and authentication
    pub accounts: AccountService,
}

impl AppState {
    /// Build state with the key provider the configuration selects.
    ///
    /// Keys are not loaded here; call [`AppState::keys`]`().preload()` to
    /// fail fast.
    pub fn new(config: Config) -> Self {
        let keys = keys::provider_from_config(&config);
        Self::with_key_provider(config, keys)
    }

    /// Build state around an explicit key provider.
    pub fn with_key_provider(config: Config, keys: KeyProvider) -> Self {
        let codec = Arc::new(TokenCodec::new(Arc::new(keys), &config));
        let resolver = AuthorizationResolver::new(Arc::clone(&codec), config.accept_legacy_scheme);
        let accounts = AccountService::new(
            KvCredentialStore::new(config.store_encryption_key),
            Arc::clone(&codec),
        );

        Self {
            config,
            codec,
            resolver,
            accounts,
        }
    }

    /// Key provider backing the codec.
    pub fn keys(&self) -> &KeyProvider {
        self.codec.keys()
    }
}
