//! Type-state token verification.
//!
//! A token moves `Unvalidated -> SignatureValidated -> Validated`; each
//! transition consumes the previous state, so claims can only be read from a
//! token that passed every check.

use std::marker::PhantomData;

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};

use super::claims::{Claims, TokenKind};
use crate::error::AuthError;

/// The only accepted signing algorithm.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::ES256;

mod sealed {
    pub trait Sealed {}
}

/// Verification stage marker.
pub trait TokenState: sealed::Sealed {
    /// Stage name for debugging.
    fn state_name() -> &'static str;
}

/// Header parsed, nothing else checked.
#[derive(Debug)]
pub struct Unvalidated;

/// Signature checked; claims decoded but not yet trusted.
#[derive(Debug)]
pub struct SignatureValidated;

/// Every check passed.
#[derive(Debug)]
pub struct Validated;

impl sealed::Sealed for Unvalidated {}
impl sealed::Sealed for SignatureValidated {}
impl sealed::Sealed for Validated {}

impl TokenState for Unvalidated {
    fn state_name() -> &'static str {
        "Unvalidated"
    }
}

impl TokenState for SignatureValidated {
    fn state_name() -> &'static str {
        "SignatureValidated"
    }
}

impl TokenState for Validated {
    fn state_name() -> &'static str {
        "Validated"
    }
}

/// How to treat tokens that carry no `kind` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindPolicy {
    /// A missing kind is malformed
    #[default]
    Strict,
    /// A missing kind is accepted in either slot
    AllowUntyped,
}

/// A JWT at some verification stage.
#[derive(Debug)]
pub struct Token<S: TokenState> {
    raw: String,
    header: Header,
    claims: Option<Claims>,
    _state: PhantomData<S>,
}

impl<S: TokenState> Token<S> {
    /// Compact serialization as received.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Decoded header.
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Current stage name.
    pub fn state_name(&self) -> &'static str {
        S::state_name()
    }
}

impl Token<Unvalidated> {
    /// Parse the header and pin the algorithm.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken` if the header is undecodable or names any
    /// algorithm other than ES256.
    pub fn parse(raw: impl Into<String>) -> Result<Self, AuthError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(AuthError::malformed("empty token"));
        }

        let header = decode_header(&raw)?;
        if header.alg != SIGNING_ALGORITHM {
            return Err(AuthError::malformed(format!("algorithm {:?} not accepted", header.alg)));
        }

        Ok(Self {
            raw,
            header,
            claims: None,
            _state: PhantomData,
        })
    }

    /// Check the signature against the verification key.
    ///
    /// Expiry is deliberately not checked here; it is a separate stage with
    /// its own error.
    ///
    /// # Errors
    ///
    /// Returns `MalformedToken` on a bad signature or undecodable claims.
    pub fn validate_signature(self, key: &DecodingKey) -> Result<Token<SignatureValidated>, AuthError> {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(&self.raw, key, &validation)?;

        Ok(Token {
            raw: self.raw,
            header: self.header,
            claims: Some(data.claims),
            _state: PhantomData,
        })
    }
}

impl Token<SignatureValidated> {
    /// Check expiry, then kind. The subject is carried through verbatim.
    ///
    /// # Errors
    ///
    /// Returns `Expired` when `exp <= now`, and `MalformedToken` on a kind
    /// mismatch.
    pub fn validate_claims(
        self,
        expected: TokenKind,
        policy: KindPolicy,
        now: i64,
    ) -> Result<Token<Validated>, AuthError> {
        let claims = self
            .claims
            .ok_or_else(|| AuthError::malformed("claims missing after signature check"))?;

        if claims.is_expired_at(now) {
            return Err(AuthError::Expired {
                expired_at: claims.expires_at(),
            });
        }

        match (claims.kind, policy) {
            (Some(kind), _) if kind == expected => {}
            (None, KindPolicy::AllowUntyped) => {}
            (Some(kind), _) => {
                return Err(AuthError::malformed(format!("{kind} token presented as {expected}")));
            }
            (None, KindPolicy::Strict) => return Err(AuthError::malformed("token kind missing")),
        }

        Ok(Token {
            raw: self.raw,
            header: self.header,
            claims: Some(claims),
            _state: PhantomData,
        })
    }
}

impl Token<Validated> {
    /// Trusted claims.
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    /// Consume the token, keeping its claims.
    ///
    /// # Errors
    ///
    /// Never fails for a token built through the validation chain.
    pub fn into_claims(self) -> Result<Claims, AuthError> {
        self.claims
            .ok_or_else(|| AuthError::internal("validated token without claims"))
    }
}
