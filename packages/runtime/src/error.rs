//! Error types for the dispatch runtime.

use reducible_state::StateError;
use thiserror::Error;

use crate::render::RenderError;

/// Errors that can occur while dispatching a message.
///
/// None of these are retried. `UnknownPath` and `UnsupportedVersion` point
/// at a bad or stale client reference; everything else is a fault in a
/// component or its effects.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The target path does not exist in the tree.
    #[error("unknown path: {path}")]
    UnknownPath { path: String },

    /// An envelope names a component that was never registered.
    #[error("unknown component: {0}")]
    UnknownComponent(String),

    /// The envelope carries a format tag this runtime can't read.
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u32),

    /// A reducer produced an outcome outside the sanctioned shapes.
    #[error("invalid reducer result from {component}: {reason}")]
    InvalidReducerResult { component: String, reason: String },

    /// A reducer declined a message kind it does not handle.
    #[error("no matching pattern in {component}#reduce for message '{kind}'")]
    UnhandledMessage { component: String, kind: String },

    /// An effect failed instead of yielding a message or nothing.
    #[error("effect contract violation in {component} at {path}: {message}")]
    EffectContractViolation {
        component: String,
        path: String,
        message: String,
    },

    /// Effects kept producing follow-up messages past the step ceiling.
    #[error("too many effect steps in {component} at {path} (limit {limit})")]
    EffectBudgetExceeded {
        component: String,
        path: String,
        limit: usize,
    },

    /// Persisted data could not be hydrated into the component's state type.
    #[error("invalid state for {component}: {message}")]
    InvalidState { component: String, message: String },

    /// The process-wide registry was installed twice.
    #[error("component registry is already installed")]
    RegistryAlreadyInstalled,

    /// The process-wide registry was read before installation.
    #[error("component registry is not installed")]
    RegistryNotInstalled,

    /// A state-layer operation failed.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// The rendering collaborator failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl DispatchError {
    /// Whether the failure stems from the client's input rather than a
    /// component-authoring fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DispatchError::UnknownPath { .. }
                | DispatchError::UnsupportedVersion(_)
                | DispatchError::State(StateError::MalformedMessage { .. })
        )
    }
}

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
