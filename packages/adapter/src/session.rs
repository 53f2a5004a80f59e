//! The tree stays in the server-side session; the client holds a signed key.

use reducible_state::{AdapterError, Envelope, RequestContext, StateAdapter, STATE_PARAM};
use serde::{Deserialize, Serialize};

use crate::verifier::Verifier;

const SESSION_PREFIX: &str = "vcr:";

/// The signed part of a key-reference token.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct KeyRef {
    pub(crate) k: String,
}

/// A fresh 16-byte random key, hex encoded.
pub(crate) fn random_key() -> String {
    hex::encode(rand::random::<[u8; 16]>())
}

/// Stores envelope JSON in the request session under `vcr:{key}`.
///
/// Every dump writes a new entry. Old entries are left for the session
/// store to expire.
#[derive(Clone, Debug)]
pub struct SessionAdapter {
    verifier: Verifier,
}

impl SessionAdapter {
    pub fn new(verifier: Verifier) -> Self {
        Self { verifier }
    }

    pub fn with_secret(secret: impl AsRef<[u8]>) -> Result<Self, AdapterError> {
        Ok(Self::new(Verifier::new(secret)?))
    }

    fn session_key(key: &str) -> String {
        format!("{SESSION_PREFIX}{key}")
    }
}

impl StateAdapter for SessionAdapter {
    fn dump(&self, envelope: &Envelope, request: &mut RequestContext) -> Result<String, AdapterError> {
        let key = random_key();
        let json = envelope
            .to_json()
            .map_err(|e| AdapterError::Encode(e.to_string()))?;
        request.session.insert(Self::session_key(&key), json);
        tracing::debug!(path = %envelope.path, key = %key, "stored state in session");
        self.verifier.generate(&KeyRef { k: key })
    }

    fn load(&self, request: &RequestContext) -> Result<Envelope, AdapterError> {
        let KeyRef { k } = self.verifier.verify(request.require_param(STATE_PARAM)?)?;
        let raw = request
            .session
            .get(&Self::session_key(&k))
            .ok_or(AdapterError::MissingEntry(k))?;
        Envelope::from_json(raw).map_err(|e| AdapterError::Decode(e.to_string()))
    }
}
