//! AES-256-GCM-SIV encryption of QR product payloads.
//!
//! Stored format is standard base64 of `nonce (12 bytes) || ciphertext || tag`.

use aes_gcm_siv::{
    Aes256GcmSiv, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD};

use super::{CryptoError, derive_key};

const PAYLOAD_KEY_INFO: &[u8] = b"qr-payload-v1";
const NONCE_LEN: usize = 12;

/// Encrypts and decrypts product data embedded in QR records.
#[derive(Clone)]
pub struct PayloadCipher {
    cipher: Aes256GcmSiv,
}

impl PayloadCipher {
    /// Build a cipher from the master secret.
    pub fn from_secret(secret: &[u8]) -> Result<Self, CryptoError> {
        let key = derive_key(secret, PAYLOAD_KEY_INFO)?;
        let cipher =
            Aes256GcmSiv::new_from_slice(&key).map_err(|_| CryptoError::KeyDerivation)?;
        Ok(Self { cipher })
    }

    /// Serialize `product` to JSON and encrypt it under a fresh random nonce.
    pub fn encrypt(&self, product: &serde_json::Value) -> Result<String, CryptoError> {
        let plaintext = serde_json::to_vec(product).map_err(|_| CryptoError::InvalidPlaintext)?;
        let nonce_bytes: [u8; NONCE_LEN] = rand::random();

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_slice())
            .map_err(|_| CryptoError::Encryption)?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok(STANDARD.encode(blob))
    }

    /// Decrypt a stored payload back into its JSON product data.
    ///
    /// # Errors
    ///
    /// - `MalformedCiphertext`: not base64, or shorter than a nonce
    /// - `Authentication`: wrong key or tampered bytes
    /// - `InvalidPlaintext`: decrypted bytes are not JSON
    pub fn decrypt(&self, encoded: &str) -> Result<serde_json::Value, CryptoError> {
        let blob = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CryptoError::MalformedCiphertext)?;

        if blob.len() <= NONCE_LEN {
            return Err(CryptoError::MalformedCiphertext);
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| CryptoError::Authentication)?;

        serde_json::from_slice(&plaintext).map_err(|_| CryptoError::InvalidPlaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cipher() -> PayloadCipher {
        PayloadCipher::from_secret(b"0123456789abcdef0123456789abcdef").expect("cipher")
    }

    #[test]
    fn test_round_trip_preserves_product() {
        let product = json!({"name": "Arabica 250g", "batch": "B-2291"});
        let encoded = cipher().encrypt(&product).expect("encrypt");
        assert_eq!(cipher().decrypt(&encoded).expect("decrypt"), product);
    }

    #[test]
    fn test_nonce_is_fresh_per_encryption() {
        let product = json!({"name": "same"});
        let a = cipher().encrypt(&product).expect("encrypt");
        let b = cipher().encrypt(&product).expect("encrypt");
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let encoded = cipher().encrypt(&json!({"name": "x"})).expect("encrypt");
        let mut blob = STANDARD.decode(&encoded).expect("base64");
        let last = blob.len() - 1;
        blob[last] ^= 0x01;

        let result = cipher().decrypt(&STANDARD.encode(blob));
        assert!(matches!(result, Err(CryptoError::Authentication)));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let encoded = cipher().encrypt(&json!({"name": "x"})).expect("encrypt");
        let other =
            PayloadCipher::from_secret(b"ffffffffffffffffffffffffffffffff").expect("cipher");
        assert!(matches!(
            other.decrypt(&encoded),
            Err(CryptoError::Authentication)
        ));
    }

    #[test]
    fn test_garbage_input_rejected() {
        assert!(matches!(
            cipher().decrypt("%%% not base64 %%%"),
            Err(CryptoError::MalformedCiphertext)
        ));
        assert!(matches!(
            cipher().decrypt(&STANDARD.encode([0u8; 8])),
            Err(CryptoError::MalformedCiphertext)
        ));
    }
}
