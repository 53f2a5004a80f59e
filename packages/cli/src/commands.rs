//! Command execution.
//!
//! Commands:
//! - `init <component>` - Print the initial tree of a demo and its state token
//! - `dispatch --state <token> --msg <kind>` - Apply a message and print the new tree and token
//! - `show --state <token> [--json]` - Decode a token and print its tree
//! - `components` - List the bundled demos
//!
//! The CLI is stateless between invocations: every command that changes
//! state prints a signed token to pass to the next one.

use std::sync::Arc;

use nu_ansi_term::{Color, Style};
use thiserror::Error;

use reducible_adapter::{AdapterConfig, AdapterError, AdapterKind, StateAdapter};
use reducible_runtime::endpoint::PARTIAL_PARAM;
use reducible_runtime::{
    handle, DebugPayload, DispatchRequest, EffectContext, EndpointError, Runtime, RuntimeConfig,
};
use reducible_state::{
    Envelope, RequestContext, MSG_PAYLOAD_PARAM, MSG_TYPE_PARAM, TARGET_PATH_PARAM,
};

use crate::demos;
use crate::text::TextRenderer;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("unknown component '{0}' (see `reducible components`)")]
    UnknownDemo(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error(transparent)]
    Endpoint(#[from] EndpointError),

    #[error(transparent)]
    Runtime(#[from] reducible_runtime::DispatchError),

    #[error("failed to format output: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CliError>;

/// What a command produced.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub rendered: String,
    pub token: String,
    pub debug: Option<DebugPayload>,
}

/// Runtime, adapter and effect context shared by every command.
pub struct Driver {
    runtime: Runtime,
    adapter: Box<dyn StateAdapter>,
    ctx: EffectContext,
}

impl Driver {
    /// Build a driver over the demo registry.
    ///
    /// Settings come from the environment; an explicit `secret` wins over
    /// `REDUCIBLE_SECRET`. The adapter is always the hidden-field one since
    /// nothing survives between invocations.
    pub fn new(secret: Option<String>) -> Result<Self> {
        let mut config = AdapterConfig::from_env()?.with_kind(AdapterKind::HiddenField);
        if let Some(secret) = secret {
            config = config.with_secret(secret);
        }
        Self::with_config(&config)
    }

    pub fn with_config(config: &AdapterConfig) -> Result<Self> {
        Ok(Self {
            runtime: Runtime::new(Arc::new(demos::registry()), RuntimeConfig::default()),
            adapter: config.build()?,
            ctx: EffectContext::new().with_metadata("source", "cli"),
        })
    }

    /// Replace the effect context, for example to freeze the clock.
    #[must_use]
    pub fn with_context(mut self, ctx: EffectContext) -> Self {
        self.ctx = ctx;
        self
    }

    pub fn init(&self, name: &str) -> Result<Outcome> {
        let demo = demos::find(name).ok_or_else(|| CliError::UnknownDemo(name.to_string()))?;
        let tree = demos::initial_tree(demo);
        let token = self.adapter.dump(&tree, &mut RequestContext::new())?;
        Ok(Outcome {
            rendered: self.runtime.render_root(&tree, &TextRenderer)?,
            token,
            debug: None,
        })
    }

    /// Apply one message, rendering only the target node when `target` is set.
    pub fn dispatch(
        &self,
        token: &str,
        kind: &str,
        payload: Option<&str>,
        target: Option<&str>,
    ) -> Result<Outcome> {
        let mut context = RequestContext::new()
            .with_param(self.adapter.state_param(), token)
            .with_param(MSG_TYPE_PARAM, kind)
            .with_param(PARTIAL_PARAM, "1");
        if let Some(payload) = payload {
            context = context.with_param(MSG_PAYLOAD_PARAM, payload);
        }
        if let Some(target) = target {
            context = context.with_param(TARGET_PATH_PARAM, target);
        }

        let response = handle(
            &self.runtime,
            self.adapter.as_ref(),
            &TextRenderer,
            DispatchRequest::new(context).with_debug(true),
            &self.ctx,
        )?;

        Ok(Outcome {
            rendered: response.body,
            token: response.state_token,
            debug: response.debug,
        })
    }

    pub fn load(&self, token: &str) -> Result<Envelope> {
        let request = RequestContext::new().with_param(self.adapter.state_param(), token);
        Ok(self.adapter.load(&request)?)
    }

    pub fn show(&self, token: &str) -> Result<Outcome> {
        let tree = self.load(token)?;
        Ok(Outcome {
            rendered: self.runtime.render_root(&tree, &TextRenderer)?,
            token: token.to_string(),
            debug: None,
        })
    }

    /// The decoded tree as pretty-printed wire JSON.
    pub fn show_json(&self, token: &str) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.load(token)?)?)
    }
}

/// Table of bundled demos.
pub fn components() -> String {
    let name_style = Style::new().bold().fg(Color::Cyan);
    let msg_style = Style::new().fg(Color::Yellow);

    let mut out = format!("{}\n\n", Style::new().bold().paint("Demo components"));
    for demo in demos::DEMOS {
        out.push_str(&format!(
            "  {} {} - {}\n",
            name_style.paint(format!("{:<10}", demo.name)),
            Color::DarkGray.paint(demo.component_id),
            demo.summary
        ));
        for message in demo.messages {
            out.push_str(&format!("             {}\n", msg_style.paint(*message)));
        }
    }
    out
}

/// Human-readable form of an outcome.
pub fn format_outcome(outcome: &Outcome, trace: bool) -> String {
    let mut out = outcome.rendered.clone();

    if trace {
        if let Some(debug) = &outcome.debug {
            out.push('\n');
            out.push_str(&format_trace(debug));
        }
    }

    out.push_str(&format!(
        "\n{} {}\n",
        Color::Green.bold().paint("state:"),
        outcome.token
    ));
    out
}

fn format_trace(debug: &DebugPayload) -> String {
    let arrow = Color::Magenta.paint(" -> ").to_string();
    let mut out = format!(
        "{} {}  {}\n",
        Style::new().bold().paint("trace"),
        Color::DarkGray.paint(&debug.path),
        debug.chain.join(arrow.as_str())
    );

    if debug.changes.is_empty() {
        out.push_str(&format!("  {}\n", Color::DarkGray.paint("(no changes)")));
    }
    for (key, change) in &debug.changes {
        let show = |v: &Option<reducible_state::Value>| match v {
            Some(v) => v.to_string(),
            None => "-".to_string(),
        };
        out.push_str(&format!(
            "  {} {} {} {}\n",
            Color::Cyan.paint(key),
            Color::Red.paint(show(&change.from)),
            Color::DarkGray.paint("->"),
            Color::Green.paint(show(&change.to)),
        ));
    }
    out
}
