//! Effects: deferred work that may produce one follow-up message.
//!
//! Reducers stay pure. Anything that touches the outside world (clocks,
//! lookups, logging) is returned as an [`Effect`] and run by the runtime
//! after the reduction, with a restricted view: the [`EffectContext`] and
//! the node being reduced.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reducible_state::{Envelope, Message};
use thiserror::Error;

/// Failure reported by a deferred effect.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct EffectError {
    message: String,
}

impl EffectError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Signature of a deferred effect.
pub type DeferredFn =
    Box<dyn Fn(&EffectContext, &Envelope) -> Result<Option<Message>, EffectError> + Send + Sync>;

/// A unit of deferred work returned by a reducer.
pub enum Effect {
    /// A precomputed follow-up message.
    Emit(Message),
    /// A computation run after the reduction. It yields a message, nothing,
    /// or an error; an error aborts the dispatch.
    Deferred(DeferredFn),
}

impl Effect {
    pub fn emit(message: Message) -> Self {
        Effect::Emit(message)
    }

    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn(&EffectContext, &Envelope) -> Result<Option<Message>, EffectError>
            + Send
            + Sync
            + 'static,
    {
        Effect::Deferred(Box::new(f))
    }

    /// Run the effect against the node that returned it.
    pub fn invoke(&self, ctx: &EffectContext, node: &Envelope) -> Result<Option<Message>, EffectError> {
        match self {
            Effect::Emit(message) => Ok(Some(message.clone())),
            Effect::Deferred(f) => f(ctx, node),
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Emit(message) => f.debug_tuple("Emit").field(message).finish(),
            Effect::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Source of wall-clock time for effects.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Ambient capabilities handed to effects.
///
/// The runtime passes it through untouched. It carries a clock, string
/// request metadata, and arbitrary typed extensions supplied by the caller.
pub struct EffectContext {
    clock: Arc<dyn Clock>,
    metadata: BTreeMap<String, String>,
    extensions: BTreeMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl EffectContext {
    pub fn new() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            metadata: BTreeMap::new(),
            extensions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Store a typed extension, replacing any previous value of that type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }
}

impl Default for EffectContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EffectContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectContext")
            .field("metadata", &self.metadata)
            .field("extensions", &self.extensions.len())
            .finish()
    }
}
