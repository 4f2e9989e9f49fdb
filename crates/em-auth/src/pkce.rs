use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::errors::{AuthError, Result};

/// RFC 3986 unreserved characters, the alphabet PKCE verifiers draw from
const UNRESERVED: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789-._~";

/// Verifier length in characters (RFC 7636 maximum)
const VERIFIER_LEN: usize = 128;

/// Generate a cryptographically random 128-character code verifier.
///
/// The verifier is the proof half of the PKCE pair; it stays in memory
/// only as long as the interactive exchange runs, so it comes back
/// zeroizing.
pub fn generate_verifier() -> Result<Zeroizing<String>> {
    let mut bytes = [0u8; VERIFIER_LEN];
    getrandom::fill(&mut bytes).map_err(|e| AuthError::Entropy(e.to_string()))?;

    let verifier: String = bytes
        .iter()
        .map(|b| UNRESERVED[(*b as usize) % UNRESERVED.len()] as char)
        .collect();

    Ok(Zeroizing::new(verifier))
}

/// Derive the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`, unpadded.
pub fn code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}
