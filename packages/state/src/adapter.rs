//! The persistence boundary.
//!
//! Between requests a state tree lives outside the process, as a
//! client-safe token or behind one. An adapter turns a tree into a token
//! (`dump`) and recovers the tree from the next request (`load`). The
//! runtime never checks authenticity itself; that is the adapter's job, and
//! a failure surfaces as [`AdapterError::InvalidSignature`].

use std::collections::BTreeMap;

use thiserror::Error;

use crate::envelope::Envelope;

/// Default request parameter carrying the state token.
pub const STATE_PARAM: &str = "vcr_state";

/// Errors raised by persistence adapters.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The token failed verification. The request must be rejected.
    #[error("invalid state signature")]
    InvalidSignature,

    /// The request did not carry the expected parameter.
    #[error("missing request parameter '{0}'")]
    MissingParam(String),

    /// The token was authentic but the stored envelope is gone.
    #[error("no stored envelope for key '{0}'")]
    MissingEntry(String),

    /// No signing secret was configured.
    #[error("state secret is missing")]
    MissingSecret,

    /// The stored payload could not be decoded into an envelope.
    #[error("state decode error: {0}")]
    Decode(String),

    /// The envelope could not be encoded.
    #[error("state encode error: {0}")]
    Encode(String),

    /// The external store failed.
    #[error("state backend error: {0}")]
    Backend(String),

    /// Adapter settings could not be parsed.
    #[error("invalid adapter configuration: {0}")]
    InvalidConfig(String),
}

impl AdapterError {
    /// Whether this is an authenticity failure rather than a storage fault.
    pub fn is_authenticity_failure(&self) -> bool {
        matches!(self, AdapterError::InvalidSignature)
    }

    /// Whether the request itself is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AdapterError::InvalidSignature
                | AdapterError::MissingParam(_)
                | AdapterError::MissingEntry(_)
                | AdapterError::Decode(_)
        )
    }
}

/// What an adapter may see and touch of the current request.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    /// Submitted form or query parameters.
    pub params: BTreeMap<String, String>,
    /// Server-side session storage for this client.
    pub session: BTreeMap<String, String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn require_param(&self, name: &str) -> Result<&str, AdapterError> {
        self.param(name)
            .ok_or_else(|| AdapterError::MissingParam(name.to_string()))
    }
}

/// Turns state trees into tokens and back.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn StateAdapter>`.
pub trait StateAdapter: Send + Sync {
    /// Name of the request parameter the token is submitted under.
    fn state_param(&self) -> &str {
        STATE_PARAM
    }

    /// Persist `envelope` and return the token the client sends back.
    fn dump(&self, envelope: &Envelope, request: &mut RequestContext) -> Result<String, AdapterError>;

    /// Recover the envelope referenced by the current request.
    fn load(&self, request: &RequestContext) -> Result<Envelope, AdapterError>;
}

impl<T: StateAdapter + ?Sized> StateAdapter for Box<T> {
    fn state_param(&self) -> &str {
        self.as_ref().state_param()
    }

    fn dump(&self, envelope: &Envelope, request: &mut RequestContext) -> Result<String, AdapterError> {
        self.as_ref().dump(envelope, request)
    }

    fn load(&self, request: &RequestContext) -> Result<Envelope, AdapterError> {
        self.as_ref().load(request)
    }
}
