//! Credential persistence.

pub mod credentials;

pub use credentials::{CredentialRecord, CredentialStore, KvCredentialStore};
