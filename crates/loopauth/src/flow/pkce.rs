//! PKCE (Proof Key for Code Exchange) implementation for `OAuth2`.
//!
//! PKCE (RFC 7636) enhances security for public clients by preventing
//! authorization code interception attacks.

use crate::error::Result;
use crate::random::{self, URL_SAFE_ALPHABET};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};

/// Length of a generated code verifier.
pub const VERIFIER_LENGTH: usize = 64;

/// PKCE code verifier and challenge pair.
///
/// A pair belongs to exactly one authorization attempt and must never be
/// reused; reuse breaks the interception-resistance guarantee.
#[derive(Debug, Clone)]
pub struct PkcePair {
    /// Code verifier (random string, sent with the token exchange).
    pub verifier: String,
    /// Code challenge (SHA-256 hash of the verifier, sent with the
    /// authorization request).
    pub challenge: String,
}

impl PkcePair {
    /// Generates a new PKCE pair.
    ///
    /// The verifier is 64 characters drawn from the unreserved URL-safe
    /// alphabet; the challenge is `base64url(sha256(verifier))` without
    /// padding.
    ///
    /// # Errors
    ///
    /// Propagates random generation configuration errors (unreachable with
    /// the built-in alphabet and length).
    pub fn generate() -> Result<Self> {
        let verifier = random::generate(VERIFIER_LENGTH, URL_SAFE_ALPHABET)?;
        let challenge = Self::derive_challenge(&verifier);
        Ok(Self {
            verifier,
            challenge,
        })
    }

    /// Computes the S256 code challenge for a verifier.
    ///
    /// Deterministic: the server performs the same derivation on the
    /// verifier sent in the exchange step.
    #[must_use]
    pub fn derive_challenge(verifier: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Returns the verifier.
    #[must_use]
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// Returns the challenge.
    #[must_use]
    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// Returns the challenge method (always S256).
    #[must_use]
    pub const fn method() -> &'static str {
        "S256"
    }
}
