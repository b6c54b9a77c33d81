//! Cryptographic primitives: product payload encryption and review tokens.
//!
//! Both keys are derived from the single `PAYLOAD_SECRET` with HKDF-SHA256,
//! using distinct info labels so a leak of one key does not expose the other.

pub mod payload;
pub mod review_token;

use hkdf::Hkdf;
use sha2::Sha256;

pub use payload::PayloadCipher;
pub use review_token::ReviewTokenSigner;

/// Errors raised by the crypto layer.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Key derivation failed")]
    KeyDerivation,

    #[error("Encryption failed")]
    Encryption,

    #[error("Malformed ciphertext")]
    MalformedCiphertext,

    #[error("Ciphertext failed authentication")]
    Authentication,

    #[error("Plaintext is not valid JSON")]
    InvalidPlaintext,

    #[error("Malformed token")]
    MalformedToken,

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token expired")]
    TokenExpired,
}

/// Derive a 256-bit key for `info` from the master secret.
fn derive_key(secret: &[u8], info: &[u8]) -> Result<[u8; 32], CryptoError> {
    let hk = Hkdf::<Sha256>::new(None, secret);
    let mut okm = [0u8; 32];
    hk.expand(info, &mut okm)
        .map_err(|_| CryptoError::KeyDerivation)?;
    Ok(okm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_keys_differ_per_label() {
        let secret = b"0123456789abcdef0123456789abcdef";
        let a = derive_key(secret, b"one").expect("derive");
        let b = derive_key(secret, b"two").expect("derive");
        assert_ne!(a, b);
        assert_eq!(a, derive_key(secret, b"one").expect("derive"));
    }
}
