//! ES256 JSON Web Tokens.

pub mod claims;
pub mod codec;
pub mod token;

pub use claims::{Claims, TokenKind};
pub use codec::{SignedToken, TokenCodec, TokenPair};
pub use token::{KindPolicy, SignatureValidated, Token, TokenState, Unvalidated, Validated, SIGNING_ALGORITHM};
