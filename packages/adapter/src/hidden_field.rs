//! The whole tree travels with the client, signed.

use reducible_state::{AdapterError, Envelope, RequestContext, StateAdapter, STATE_PARAM};

use crate::verifier::Verifier;

/// Stores the envelope in the token itself.
///
/// Stateless on the server side. The token grows with the tree.
#[derive(Clone, Debug)]
pub struct HiddenFieldAdapter {
    verifier: Verifier,
}

impl HiddenFieldAdapter {
    pub fn new(verifier: Verifier) -> Self {
        Self { verifier }
    }

    pub fn with_secret(secret: impl AsRef<[u8]>) -> Result<Self, AdapterError> {
        Ok(Self::new(Verifier::new(secret)?))
    }

    /// Decode a token without a request around it.
    pub fn load_token(&self, token: &str) -> Result<Envelope, AdapterError> {
        self.verifier.verify(token)
    }
}

impl StateAdapter for HiddenFieldAdapter {
    fn dump(&self, envelope: &Envelope, _request: &mut RequestContext) -> Result<String, AdapterError> {
        let token = self.verifier.generate(envelope)?;
        tracing::debug!(path = %envelope.path, bytes = token.len(), "dumped state into token");
        Ok(token)
    }

    fn load(&self, request: &RequestContext) -> Result<Envelope, AdapterError> {
        self.load_token(request.require_param(STATE_PARAM)?)
    }
}
