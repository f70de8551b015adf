//! User accounts: registration, authentication and password hashing.

pub mod password;
pub mod service;

pub use service::AccountService;
