//! Reducible State: the data model of a reducible component tree
//!
//! This layer knows nothing about reducers or effects. It defines:
//! - `Value`: Dynamically typed tree used for state payloads and message payloads
//! - `Schema`: Declared fields with static or computed defaults
//! - `Envelope`: One serializable node of the state tree (and its children)
//! - `Message`: A normalized event addressed to a node
//! - `Diff`: Field-level before/after changes between two state payloads
//! - `StateAdapter`: The persistence boundary that turns a tree into a token
//!
//! # Example
//!
//! ```rust
//! use reducible_state::{Envelope, Schema, Value};
//!
//! let schema = Schema::builder()
//!     .field("count", 0)
//!     .computed("items", || Value::array())
//!     .build();
//!
//! let envelope = Envelope::initial("Counter", &schema, "root");
//! assert_eq!(envelope.data.get("count"), Some(&Value::from(0)));
//! ```

pub mod adapter;
mod convert;
mod diff;
mod envelope;
mod error;
mod message;
mod schema;
mod value;

pub use adapter::{AdapterError, RequestContext, StateAdapter, STATE_PARAM};
pub use convert::{from_value, json_to_value, to_value, value_to_json};
pub use diff::{changed_keys, diff, Change, Diff};
pub use envelope::{Envelope, ROOT_PATH, SCHEMA_VERSION};
pub use error::{Result, StateError};
pub use message::{
    normalize_kind, Message, WireMessage, MSG_PAYLOAD_PARAM, MSG_TYPE_PARAM, TARGET_PATH_PARAM,
};
pub use schema::{Field, FieldDefault, Schema, SchemaBuilder};
pub use value::{StateMap, Value};
