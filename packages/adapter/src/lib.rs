//! Reducible Adapter: persistence for reducible state trees
//!
//! Every adapter implements [`StateAdapter`]: `dump` turns a tree into a
//! token for the client, `load` recovers the tree from the next request.
//! Tokens are signed with HMAC-SHA256, so a tampered token is rejected with
//! [`AdapterError::InvalidSignature`] before anything is decoded.
//!
//! - `HiddenFieldAdapter`: The token is the signed tree itself
//! - `SessionAdapter`: The tree lives in the server session, the token is a signed key
//! - `CacheAdapter`: The tree lives in a [`KeyValueCache`] with a TTL
//!
//! # Example
//!
//! ```rust
//! use reducible_adapter::{AdapterConfig, AdapterKind};
//! use reducible_state::{Envelope, RequestContext, Schema, StateAdapter, STATE_PARAM};
//!
//! let adapter = AdapterConfig::default()
//!     .with_kind(AdapterKind::HiddenField)
//!     .with_secret("change me")
//!     .build()
//!     .unwrap();
//!
//! let envelope = Envelope::initial("Counter", &Schema::builder().field("count", 0).build(), "root");
//! let mut request = RequestContext::new();
//! let token = adapter.dump(&envelope, &mut request).unwrap();
//!
//! let next = request.with_param(STATE_PARAM, token);
//! assert_eq!(adapter.load(&next).unwrap(), envelope);
//! ```

mod cache;
mod config;
mod hidden_field;
mod session;
mod verifier;

pub use cache::{
    CacheAdapter, InMemoryCache, KeyValueCache, CACHE_STATE_PARAM, DEFAULT_NAMESPACE, DEFAULT_TTL,
};
pub use config::{AdapterConfig, AdapterKind, ADAPTER_ENV, CACHE_TTL_ENV, SECRET_ENV};
pub use hidden_field::HiddenFieldAdapter;
pub use session::SessionAdapter;
pub use verifier::Verifier;

pub use reducible_state::{AdapterError, RequestContext, StateAdapter};
