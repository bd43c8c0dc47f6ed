//! Cryptographically random, URL-safe strings.
//!
//! Used for the `state` parameter and the PKCE code verifier. Both are
//! single-use values owned by exactly one authorization attempt.

use crate::error::{Error, Result};
use rand::Rng;

/// Unreserved URL-safe alphabet (RFC 3986 §2.3).
pub const URL_SAFE_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Length of a generated state token.
pub const STATE_LENGTH: usize = 32;

/// Generates `len` symbols drawn independently and uniformly from `alphabet`.
///
/// The entropy source is the thread-local CSPRNG; if the underlying OS
/// entropy source fails the process aborts rather than degrading to a weaker
/// generator.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `len` is zero or `alphabet` is empty.
pub fn generate(len: usize, alphabet: &str) -> Result<String> {
    if len == 0 {
        return Err(Error::InvalidConfig("requested length is zero".into()));
    }
    let symbols: Vec<char> = alphabet.chars().collect();
    if symbols.is_empty() {
        return Err(Error::InvalidConfig("alphabet is empty".into()));
    }

    let mut rng = rand::thread_rng();
    Ok((0..len)
        .map(|_| symbols[rng.gen_range(0..symbols.len())])
        .collect())
}

/// Generates a fresh 32-character state token for CSRF detection.
///
/// # Errors
///
/// Propagates [`Error::InvalidConfig`] (unreachable with the built-in
/// alphabet and length).
pub fn state_token() -> Result<String> {
    generate(STATE_LENGTH, URL_SAFE_ALPHABET)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_length_and_alphabet() {
        let s = generate(64, URL_SAFE_ALPHABET).unwrap();
        assert_eq!(s.chars().count(), 64);
        assert!(s.chars().all(|c| URL_SAFE_ALPHABET.contains(c)));
    }

    #[test]
    fn test_generate_custom_alphabet() {
        let s = generate(100, "ab").unwrap();
        assert!(s.chars().all(|c| c == 'a' || c == 'b'));
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(
            generate(0, URL_SAFE_ALPHABET),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_alphabet_rejected() {
        assert!(matches!(generate(16, ""), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_no_collisions_across_samples() {
        let samples: HashSet<String> = (0..10_000)
            .map(|_| generate(STATE_LENGTH, URL_SAFE_ALPHABET).unwrap())
            .collect();
        assert_eq!(samples.len(), 10_000);
    }

    #[test]
    fn test_state_token_shape() {
        let state = state_token().unwrap();
        assert_eq!(state.len(), STATE_LENGTH);
        assert!(state.chars().all(|c| URL_SAFE_ALPHABET.contains(c)));
    }
}
