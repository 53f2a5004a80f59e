//! Signed tokens.
//!
//! A token is `base64(json) + "--" + hex(hmac_sha256(secret, base64(json)))`.
//! The payload is readable by the client but cannot be altered without the
//! secret.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use reducible_state::AdapterError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: &str = "--";

/// Signs and verifies JSON payloads with a shared secret.
#[derive(Clone)]
pub struct Verifier {
    secret: Vec<u8>,
}

impl Verifier {
    /// Fails with `MissingSecret` for an empty secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AdapterError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AdapterError::MissingSecret);
        }
        Ok(Self {
            secret: secret.to_vec(),
        })
    }

    fn mac(&self, data: &[u8]) -> Result<HmacSha256, AdapterError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| AdapterError::MissingSecret)?;
        mac.update(data);
        Ok(mac)
    }

    /// Serialize `value` to JSON and sign it.
    pub fn generate<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, AdapterError> {
        let json = serde_json::to_vec(value).map_err(|e| AdapterError::Encode(e.to_string()))?;
        let data = STANDARD.encode(json);
        let digest = hex::encode(self.mac(data.as_bytes())?.finalize().into_bytes());
        Ok(format!("{data}{SEPARATOR}{digest}"))
    }

    /// Check the signature and return the raw JSON bytes.
    pub fn verify_bytes(&self, token: &str) -> Result<Vec<u8>, AdapterError> {
        let (data, digest) = token
            .rsplit_once(SEPARATOR)
            .ok_or(AdapterError::InvalidSignature)?;
        let digest = hex::decode(digest).map_err(|_| AdapterError::InvalidSignature)?;

        if self.mac(data.as_bytes())?.verify_slice(&digest).is_err() {
            tracing::warn!("rejected state token with a bad signature");
            return Err(AdapterError::InvalidSignature);
        }

        STANDARD
            .decode(data)
            .map_err(|e| AdapterError::Decode(e.to_string()))
    }

    /// Check the signature and deserialize the payload.
    ///
    /// An authentic token whose payload has the wrong shape is a `Decode`
    /// error, not a signature failure.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, AdapterError> {
        let bytes = self.verify_bytes(token)?;
        serde_json::from_slice(&bytes).map_err(|e| AdapterError::Decode(e.to_string()))
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn verifier() -> Verifier {
        Verifier::new("test-secret").unwrap()
    }

    #[test]
    fn token_layout() {
        let token = verifier().generate(&json!({"k": "abc"})).unwrap();
        let (data, digest) = token.split_once("--").unwrap();
        assert_eq!(STANDARD.decode(data).unwrap(), br#"{"k":"abc"}"#);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn verify_accepts_own_tokens() {
        let v = verifier();
        let token = v.generate(&json!({"count": 3})).unwrap();
        let back: serde_json::Value = v.verify(&token).unwrap();
        assert_eq!(back, json!({"count": 3}));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let v = verifier();
        let token = v.generate(&json!({"count": 3})).unwrap();
        let (_, digest) = token.split_once("--").unwrap();
        let forged = format!("{}--{}", STANDARD.encode(br#"{"count":999}"#), digest);

        let err = v.verify::<serde_json::Value>(&forged).unwrap_err();
        assert!(err.is_authenticity_failure());
    }

    #[test]
    fn other_secret_is_rejected() {
        let token = verifier().generate(&json!({})).unwrap();
        let other = Verifier::new("another-secret").unwrap();
        assert!(matches!(
            other.verify::<serde_json::Value>(&token),
            Err(AdapterError::InvalidSignature)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let v = verifier();
        for token in ["", "no-separator", "abc--not-hex", "abc--00ff"] {
            assert!(
                matches!(v.verify_bytes(token), Err(AdapterError::InvalidSignature)),
                "token: {:?}",
                token
            );
        }
    }

    #[test]
    fn authentic_but_wrong_shape_is_decode_error() {
        let v = verifier();
        let token = v.generate(&json!([1, 2])).unwrap();
        assert!(matches!(
            v.verify::<std::collections::BTreeMap<String, String>>(&token),
            Err(AdapterError::Decode(_))
        ));
    }

    #[test]
    fn empty_secret() {
        assert!(matches!(Verifier::new(""), Err(AdapterError::MissingSecret)));
    }

    #[test]
    fn debug_hides_secret() {
        assert!(!format!("{:?}", verifier()).contains("test-secret"));
    }
}
