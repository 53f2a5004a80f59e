//! Reducible Runtime: reducers, effects and dispatch over a component tree
//!
//! A dispatch routes one message to one node of an [`Envelope`] tree, runs
//! that node's reducer, drains the effects the reducer returned (each may
//! produce one more message for the same node) and hands back a new tree.
//!
//! - `Component` / `ComponentDef`: The reducer contract
//! - `Effect`: Deferred work yielding at most one follow-up message
//! - `Registry`: Component id to definition, built once and shared
//! - `Runtime`: The dispatcher
//! - `Trace`: What happened during a dispatch
//! - `endpoint::handle`: Load, dispatch, persist and render in one call
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use reducible_runtime::{DynamicComponent, EffectContext, ReducerOutcome, Registry, Runtime, RuntimeConfig};
//! use reducible_state::{Message, Schema, Value};
//!
//! let counter = DynamicComponent::new("Counter", Schema::builder().field("count", 0).build(), |mut s, msg| {
//!     match msg.kind() {
//!         "increment" => {
//!             let n = s.get("count").and_then(Value::as_i64).unwrap_or(0);
//!             s.insert("count".into(), Value::from(n + 1));
//!             ReducerOutcome::state(s)
//!         }
//!         _ => ReducerOutcome::unhandled(),
//!     }
//! });
//!
//! let registry = Arc::new(Registry::builder().register_def(counter).build());
//! let runtime = Runtime::new(registry, RuntimeConfig::default());
//!
//! let tree = runtime.initial_envelope("Counter", "root").unwrap();
//! let next = runtime
//!     .dispatch(&tree, Message::bare("Increment"), "root", &EffectContext::new())
//!     .unwrap();
//! assert_eq!(next.data.get("count"), Some(&Value::from(1)));
//! ```
//!
//! [`Envelope`]: reducible_state::Envelope

pub mod component;
pub mod effect;
pub mod endpoint;
mod error;
pub mod registry;
pub mod render;
mod runtime;
pub mod trace;

pub use component::{
    default_state, Component, ComponentDef, DynamicComponent, ReducerOutcome, Reduction, Returned,
};
pub use effect::{Clock, Effect, EffectContext, EffectError, FixedClock, SystemClock};
pub use endpoint::{handle, DispatchRequest, DispatchResponse, EndpointError};
pub use error::{DispatchError, Result};
pub use registry::{Registry, RegistryBuilder};
pub use render::{inject_state, RenderError, Renderer};
pub use runtime::{Dispatched, Runtime, RuntimeConfig, DEFAULT_MAX_EFFECT_STEPS};
pub use trace::{DebugPayload, Trace, TraceStep};
