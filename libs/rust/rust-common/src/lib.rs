//! Shared library for cross-cutting concerns in the auth token workspace.
//!
//! This crate provides:
//! - The store error type
//! - A namespaced key-value store with atomic insert-if-absent
//! - Tracing subscriber initialisation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod kv_store;
pub mod tracing_config;

pub use error::PlatformError;
pub use kv_store::{KvStore, KvStoreConfig};
pub use tracing_config::{init_tracing, TracingConfig};
