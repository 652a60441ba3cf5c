//! PKCE (Proof Key for Code Exchange) material and random string generation.

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use rand::Rng;
use sha2::{Digest, Sha256};

/// Characters random strings are drawn from (RFC 7636 unreserved set).
pub const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-_~.";

/// Length the identity provider expects for the code verifier.
pub const DEFAULT_LENGTH: usize = 43;

/// Generate a random string of `len` characters from [`ALPHABET`].
#[must_use]
pub fn next_string(len: usize) -> String {
    next_string_with(&mut rand::thread_rng(), len)
}

/// Like [`next_string`], drawing from the given generator.
pub fn next_string_with<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
        .collect()
}

/// Computes the S256 code challenge from a code verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`, without padding.
#[must_use]
pub fn code_challenge(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Per-attempt PKCE values. Dropped together with the login attempt.
#[derive(Debug)]
pub struct PkceMaterial {
    pub state: String,
    pub nonce: String,
    pub code_verifier: String,
    pub code_challenge: String,
}

impl PkceMaterial {
    /// Generate fresh material with a verifier of `len` characters.
    ///
    /// `state` and `nonce` are standard base64 of a random string, the way the
    /// provider's browser SDK produces them.
    #[must_use]
    pub fn generate(len: usize) -> Self {
        let code_verifier = next_string(len);
        let code_challenge = code_challenge(&code_verifier);
        Self {
            state: STANDARD.encode(next_string(len)),
            nonce: STANDARD.encode(next_string(len)),
            code_verifier,
            code_challenge,
        }
    }
}
