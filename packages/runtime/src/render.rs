//! The rendering boundary.
//!
//! The runtime doesn't know how markup is produced. It only needs a
//! [`Renderer`] that can turn a component id and its envelope into markup.

use reducible_state::Envelope;
use thiserror::Error;

/// Failure reported by a renderer.
#[derive(Debug, Error)]
#[error("render failed for {component}: {message}")]
pub struct RenderError {
    pub component: String,
    pub message: String,
}

impl RenderError {
    pub fn new(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Renders one envelope (and, at its discretion, its children).
pub trait Renderer: Send + Sync {
    fn render(&self, component_id: &str, envelope: &Envelope) -> Result<String, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&str, &Envelope) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, component_id: &str, envelope: &Envelope) -> Result<String, RenderError> {
        self(component_id, envelope)
    }
}

/// Insert a state token into a full HTML response.
///
/// The token goes into `<meta name="vcr-state">` just before `</head>`, or at
/// the very start when there is no head.
pub fn inject_state(html: &str, token: &str) -> String {
    let meta = format!(r#"<meta name="vcr-state" content="{}">"#, escape_html(token));
    match html.find("</head>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + meta.len());
            out.push_str(&html[..at]);
            out.push_str(&meta);
            out.push_str(&html[at..]);
            out
        }
        None => meta + html,
    }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
