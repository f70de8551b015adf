//! Request authorization.

pub mod credentials;
pub mod resolver;

pub use credentials::{CredentialScheme, RequestCredentials};
pub use resolver::{Authorization, AuthorizationResolver};
