//! One full request round trip.
//!
//! Load the tree through an adapter, decode the submitted message, dispatch
//! it, persist the new tree and render either the whole page or just the
//! addressed node.

use reducible_state::{
    AdapterError, RequestContext, StateAdapter, StateError, WireMessage,
};
use thiserror::Error;

use crate::effect::EffectContext;
use crate::error::DispatchError;
use crate::render::{inject_state, Renderer};
use crate::runtime::Runtime;
use crate::trace::DebugPayload;

/// Request parameter that asks for a partial response.
pub const PARTIAL_PARAM: &str = "vcr_partial";

/// Response header carrying the state token of a partial response.
pub const STATE_HEADER: &str = "X-VCR-State";

/// Header carrying the JSON debug payload.
pub const DEBUG_HEADER: &str = "X-VCR-Debug";

/// Errors surfaced by [`handle`].
#[derive(Debug, Error)]
pub enum EndpointError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl EndpointError {
    /// Whether the request itself was bad, as opposed to a server fault.
    pub fn is_client_error(&self) -> bool {
        match self {
            EndpointError::Adapter(e) => e.is_client_error(),
            EndpointError::Dispatch(e) => e.is_client_error(),
            EndpointError::State(e) => matches!(e, StateError::MalformedMessage { .. }),
        }
    }

    /// HTTP status to answer with.
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}

/// An inbound dispatch request.
#[derive(Clone, Debug, Default)]
pub struct DispatchRequest {
    pub context: RequestContext,
    /// Attach a [`DebugPayload`] to the response.
    pub debug: bool,
}

impl DispatchRequest {
    pub fn new(context: RequestContext) -> Self {
        Self {
            context,
            debug: false,
        }
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn is_partial(&self) -> bool {
        self.context.param(PARTIAL_PARAM) == Some("1")
    }
}

/// What to send back to the client.
#[derive(Clone, Debug)]
pub struct DispatchResponse {
    /// Markup: the full page with the token injected, or the target node only.
    pub body: String,
    /// Token for the next round trip.
    pub state_token: String,
    pub partial: bool,
    pub debug: Option<DebugPayload>,
    /// The request context after the adapter wrote to it.
    pub context: RequestContext,
}

impl DispatchResponse {
    /// Extra response headers, in the order they should be written.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = Vec::new();
        if self.partial {
            headers.push((STATE_HEADER, self.state_token.clone()));
        }
        if let Some(json) = self.debug.as_ref().and_then(|d| d.to_json().ok()) {
            headers.push((DEBUG_HEADER, json));
        }
        headers
    }
}

/// Run one dispatch request end to end.
///
/// The target defaults to the loaded tree's root path when the request
/// names none.
pub fn handle(
    runtime: &Runtime,
    adapter: &dyn StateAdapter,
    renderer: &dyn Renderer,
    request: DispatchRequest,
    ctx: &EffectContext,
) -> Result<DispatchResponse, EndpointError> {
    let partial = request.is_partial();
    let DispatchRequest { mut context, debug } = request;

    let envelope = adapter.load(&context)?;
    let wire = WireMessage::from_params(&context.params)?;
    let message = wire.decode()?;
    let target = wire.target_path.unwrap_or_else(|| envelope.path.clone());

    let dispatched = runtime.dispatch_traced(&envelope, message, &target, ctx)?;
    let state_token = adapter.dump(&dispatched.envelope, &mut context)?;

    let body = if partial {
        runtime.render_target(&dispatched.envelope, &target, renderer)?
    } else {
        let html = runtime.render_root(&dispatched.envelope, renderer)?;
        inject_state(&html, &state_token)
    };

    tracing::info!(
        target_path = %target,
        partial,
        chain = ?dispatched.trace.chain(),
        "handled dispatch"
    );

    Ok(DispatchResponse {
        body,
        state_token,
        partial,
        debug: debug.then(|| dispatched.trace.debug_payload()),
        context,
    })
}
