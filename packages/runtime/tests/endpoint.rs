use std::sync::Arc;

use reducible_runtime::endpoint::{DEBUG_HEADER, PARTIAL_PARAM, STATE_HEADER};
use reducible_runtime::{
    handle, DispatchRequest, DynamicComponent, EffectContext, EndpointError, ReducerOutcome,
    Registry, RenderError, Runtime, RuntimeConfig,
};
use reducible_state::{
    AdapterError, Envelope, RequestContext, Schema, StateAdapter, StateError, Value,
    MSG_PAYLOAD_PARAM, MSG_TYPE_PARAM, STATE_PARAM, TARGET_PATH_PARAM,
};

/// Stores the tree as plain JSON in the state parameter.
struct PlainAdapter;

impl StateAdapter for PlainAdapter {
    fn dump(&self, envelope: &Envelope, _request: &mut RequestContext) -> Result<String, AdapterError> {
        envelope.to_json().map_err(|e| AdapterError::Encode(e.to_string()))
    }

    fn load(&self, request: &RequestContext) -> Result<Envelope, AdapterError> {
        let token = request.require_param(self.state_param())?;
        Envelope::from_json(token).map_err(|e| AdapterError::Decode(e.to_string()))
    }
}

fn counter() -> DynamicComponent {
    DynamicComponent::new("Counter", Schema::builder().field("count", 0).build(), |mut s, msg| {
        let n = s.get("count").and_then(Value::as_i64).unwrap_or(0);
        match msg.kind() {
            "increment" => {
                let by = msg.payload_field("by").and_then(Value::as_i64).unwrap_or(1);
                s.insert("count".into(), Value::from(n + by));
                ReducerOutcome::state(s)
            }
            _ => ReducerOutcome::unhandled(),
        }
    })
}

fn render(id: &str, env: &Envelope) -> Result<String, RenderError> {
    let count = env.data.get("count").and_then(Value::as_i64).unwrap_or(0);
    let node = format!(r#"<div data-vcr-path="{}">{} {}</div>"#, env.path, id, count);
    if env.path == "root" {
        let children: String = env
            .children
            .values()
            .map(|child| render(&child.component_id, child))
            .collect::<Result<_, _>>()?;
        Ok(format!("<html><head></head><body>{}{}</body></html>", node, children))
    } else {
        Ok(node)
    }
}

fn runtime() -> Runtime {
    let registry = Registry::builder().register_def(counter()).build();
    Runtime::new(Arc::new(registry), RuntimeConfig::default())
}

fn token(rt: &Runtime) -> String {
    let tree = rt
        .initial_envelope("Counter", "root")
        .unwrap()
        .with_child(rt.initial_envelope("Counter", "root/1").unwrap());
    tree.to_json().unwrap()
}

fn request(rt: &Runtime) -> RequestContext {
    RequestContext::new()
        .with_param(STATE_PARAM, token(rt))
        .with_param(MSG_TYPE_PARAM, "Increment")
}

#[test]
fn test_full_page_response_injects_state() {
    let rt = runtime();
    let response = handle(
        &rt,
        &PlainAdapter,
        &render,
        DispatchRequest::new(request(&rt)),
        &EffectContext::new(),
    )
    .unwrap();

    assert!(!response.partial);
    assert!(response.body.starts_with("<html><head><meta name=\"vcr-state\" content=\"{&quot;"));
    assert!(response.body.contains(r#"<div data-vcr-path="root">Counter 1</div>"#));
    assert!(response.debug.is_none());
    assert!(response.headers().is_empty());

    let next = Envelope::from_json(&response.state_token).unwrap();
    assert_eq!(next.data.get("count"), Some(&Value::from(1)));
}

#[test]
fn test_partial_response_renders_target_only() {
    let rt = runtime();
    let ctx = request(&rt)
        .with_param(PARTIAL_PARAM, "1")
        .with_param(TARGET_PATH_PARAM, "root/1")
        .with_param(MSG_PAYLOAD_PARAM, r#"{"by": 5}"#);

    let response = handle(
        &rt,
        &PlainAdapter,
        &render,
        DispatchRequest::new(ctx),
        &EffectContext::new(),
    )
    .unwrap();

    assert!(response.partial);
    assert_eq!(response.body, r#"<div data-vcr-path="root/1">Counter 5</div>"#);
    assert_eq!(
        response.headers(),
        vec![(STATE_HEADER, response.state_token.clone())]
    );

    let next = Envelope::from_json(&response.state_token).unwrap();
    assert_eq!(next.data.get("count"), Some(&Value::from(0)));
}

#[test]
fn test_debug_payload_on_request() {
    let rt = runtime();
    let response = handle(
        &rt,
        &PlainAdapter,
        &render,
        DispatchRequest::new(request(&rt)).with_debug(true),
        &EffectContext::new(),
    )
    .unwrap();

    let debug = response.debug.as_ref().unwrap();
    assert_eq!(debug.path, "root");
    assert_eq!(debug.msg_type, "increment");
    assert_eq!(debug.chain, vec!["increment"]);
    assert_eq!(debug.changed_keys, vec!["count"]);
    assert!(response.headers().iter().any(|(name, _)| *name == DEBUG_HEADER));
}

#[test]
fn test_missing_message_type_is_bad_request() {
    let rt = runtime();
    let ctx = RequestContext::new().with_param(STATE_PARAM, token(&rt));
    let err = handle(
        &rt,
        &PlainAdapter,
        &render,
        DispatchRequest::new(ctx),
        &EffectContext::new(),
    )
    .unwrap_err();

    assert!(matches!(err, EndpointError::State(StateError::MalformedMessage { .. })));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_malformed_payload_is_bad_request() {
    let rt = runtime();
    let ctx = request(&rt).with_param(MSG_PAYLOAD_PARAM, "{not json");
    let err = handle(
        &rt,
        &PlainAdapter,
        &render,
        DispatchRequest::new(ctx),
        &EffectContext::new(),
    )
    .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_stale_target_is_bad_request() {
    let rt = runtime();
    let ctx = request(&rt).with_param(TARGET_PATH_PARAM, "root/7");
    let err = handle(
        &rt,
        &PlainAdapter,
        &render,
        DispatchRequest::new(ctx),
        &EffectContext::new(),
    )
    .unwrap_err();
    assert!(matches!(err, EndpointError::Dispatch(_)));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_missing_state_is_bad_request() {
    let rt = runtime();
    let ctx = RequestContext::new().with_param(MSG_TYPE_PARAM, "increment");
    let err = handle(
        &rt,
        &PlainAdapter,
        &render,
        DispatchRequest::new(ctx),
        &EffectContext::new(),
    )
    .unwrap_err();
    assert!(matches!(err, EndpointError::Adapter(AdapterError::MissingParam(_))));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn test_reducer_fault_is_server_error() {
    let rt = runtime();
    let ctx = request(&rt).with_param(MSG_TYPE_PARAM, "explode");
    let err = handle(
        &rt,
        &PlainAdapter,
        &render,
        DispatchRequest::new(ctx),
        &EffectContext::new(),
    )
    .unwrap_err();
    assert_eq!(err.status_code(), 500);
}
