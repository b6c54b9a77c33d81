//! Short-lived tokens that prove a review follows a genuine verification.
//!
//! Format: `{expires_unix}.{hex(HMAC-SHA256(key, "{qr_id}:{expires_unix}"))}`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use super::{CryptoError, derive_key};

type HmacSha256 = Hmac<Sha256>;

const REVIEW_KEY_INFO: &[u8] = b"qr-review-token-v1";

/// Issues and checks review tokens.
#[derive(Clone)]
pub struct ReviewTokenSigner {
    key: [u8; 32],
}

impl ReviewTokenSigner {
    /// Build a signer from the master secret.
    pub fn from_secret(secret: &[u8]) -> Result<Self, CryptoError> {
        Ok(Self {
            key: derive_key(secret, REVIEW_KEY_INFO)?,
        })
    }

    /// Issue a token for `qr_id` valid until `expires_at`.
    pub fn issue(&self, qr_id: Uuid, expires_at: DateTime<Utc>) -> Result<String, CryptoError> {
        let expires = expires_at.timestamp();
        let mac = self.mac(qr_id, expires)?;
        Ok(format!(
            "{}.{}",
            expires,
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    /// Check a token for `qr_id` at time `now`, returning its expiry.
    ///
    /// The signature is compared in constant time.
    pub fn verify(
        &self,
        token: &str,
        qr_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, CryptoError> {
        let (expires_str, signature_hex) =
            token.split_once('.').ok_or(CryptoError::MalformedToken)?;

        let expires: i64 = expires_str
            .parse()
            .map_err(|_| CryptoError::MalformedToken)?;
        let signature = hex::decode(signature_hex).map_err(|_| CryptoError::MalformedToken)?;

        self.mac(qr_id, expires)?
            .verify_slice(&signature)
            .map_err(|_| CryptoError::BadSignature)?;

        let expires_at =
            DateTime::<Utc>::from_timestamp(expires, 0).ok_or(CryptoError::MalformedToken)?;
        if expires_at <= now {
            return Err(CryptoError::TokenExpired);
        }

        Ok(expires_at)
    }

    fn mac(&self, qr_id: Uuid, expires: i64) -> Result<HmacSha256, CryptoError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| CryptoError::KeyDerivation)?;
        mac.update(format!("{qr_id}:{expires}").as_bytes());
        Ok(mac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn signer() -> ReviewTokenSigner {
        ReviewTokenSigner::from_secret(b"0123456789abcdef0123456789abcdef").expect("signer")
    }

    #[test]
    fn test_issued_token_verifies() {
        let qr_id = Uuid::new_v4();
        let now = Utc::now();
        let token = signer().issue(qr_id, now + Duration::minutes(30)).expect("issue");
        assert!(signer().verify(&token, qr_id, now).is_ok());
    }

    #[test]
    fn test_token_bound_to_qr_id() {
        let now = Utc::now();
        let token = signer()
            .issue(Uuid::new_v4(), now + Duration::minutes(30))
            .expect("issue");
        assert!(matches!(
            signer().verify(&token, Uuid::new_v4(), now),
            Err(CryptoError::BadSignature)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let qr_id = Uuid::new_v4();
        let now = Utc::now();
        let token = signer().issue(qr_id, now - Duration::seconds(5)).expect("issue");
        assert!(matches!(
            signer().verify(&token, qr_id, now),
            Err(CryptoError::TokenExpired)
        ));
    }

    #[test]
    fn test_extended_expiry_breaks_signature() {
        let qr_id = Uuid::new_v4();
        let now = Utc::now();
        let token = signer().issue(qr_id, now + Duration::minutes(1)).expect("issue");
        let (_, sig) = token.split_once('.').expect("dot");
        let forged = format!("{}.{}", (now + Duration::days(365)).timestamp(), sig);

        assert!(matches!(
            signer().verify(&forged, qr_id, now),
            Err(CryptoError::BadSignature)
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let qr_id = Uuid::new_v4();
        let now = Utc::now();
        for token in ["", "nodot", "abc.def", "123.zz"] {
            assert!(matches!(
                signer().verify(token, qr_id, now),
                Err(CryptoError::MalformedToken)
            ));
        }
    }
}
