//! Messages addressed to nodes of a state tree.
//!
//! Message kinds arrive as arbitrary client strings (`"ClickedSave"`,
//! `"clicked-save"`, ...) and are normalized to one canonical identifier so
//! reducers can match on a stable value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::convert::json_to_value;
use crate::error::{Result, StateError};
use crate::value::Value;

/// Form field carrying the message kind.
pub const MSG_TYPE_PARAM: &str = "vcr_msg_type";
/// Form field carrying the JSON payload.
pub const MSG_PAYLOAD_PARAM: &str = "vcr_msg_payload";
/// Form field carrying the addressed node path.
pub const TARGET_PATH_PARAM: &str = "vcr_target_path";

/// Canonicalize a message kind.
///
/// Camel-case boundaries and runs of non-alphanumeric characters become a
/// single `_`, the result is lowercased and stripped of leading or trailing
/// separators.
///
/// ```rust
/// use reducible_state::normalize_kind;
///
/// assert_eq!(normalize_kind("ClickedSave"), "clicked_save");
/// assert_eq!(normalize_kind("clicked_save"), "clicked_save");
/// assert_eq!(normalize_kind("reset-logged"), "reset_logged");
/// ```
pub fn normalize_kind(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len() + 4);

    let push_separator = |out: &mut String| {
        if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    };

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            push_separator(&mut out);
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            // "clickedSave", "step2Done", and the "S" in "HTTPServer"
            if prev.is_lowercase() || prev.is_numeric() || (prev.is_uppercase() && next_is_lower) {
                push_separator(&mut out);
            }
        }
        out.extend(c.to_lowercase());
    }

    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// A typed event with a normalized kind and an arbitrary payload.
///
/// The payload is never `Null`: an absent payload is the empty map.
/// Deserialization goes through [`Message::new`] as well.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawMessage")]
pub struct Message {
    #[serde(rename = "type")]
    kind: String,
    payload: Value,
}

#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl From<RawMessage> for Message {
    fn from(raw: RawMessage) -> Self {
        Message::new(&raw.kind, raw.payload)
    }
}

impl Message {
    /// Create a message, normalizing its kind and payload.
    pub fn new(kind: &str, payload: impl Into<Value>) -> Self {
        let payload = match payload.into() {
            Value::Null => Value::map(),
            other => other,
        };
        Self {
            kind: normalize_kind(kind),
            payload,
        }
    }

    /// A message with the empty payload.
    pub fn bare(kind: &str) -> Self {
        Self::new(kind, Value::map())
    }

    /// Decode a message from its wire form.
    ///
    /// An absent or blank payload yields the empty payload. A payload that
    /// is present but not valid JSON is a `MalformedMessage`.
    pub fn from_wire(kind: &str, payload: Option<&str>) -> Result<Self> {
        if normalize_kind(kind).is_empty() {
            return Err(StateError::malformed(kind, "message kind is empty"));
        }

        let payload = match payload.map(str::trim) {
            None | Some("") => Value::map(),
            Some(raw) => {
                let json: serde_json::Value = serde_json::from_str(raw)
                    .map_err(|e| StateError::malformed(kind, e.to_string()))?;
                json_to_value(json)
            }
        };

        Ok(Self::new(kind, payload))
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Whether this message has the given kind, compared after normalization.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == normalize_kind(kind)
    }

    /// Look up a top-level payload field.
    pub fn payload_field(&self, name: &str) -> Option<&Value> {
        self.payload.get(name)
    }

    pub fn into_parts(self) -> (String, Value) {
        (self.kind, self.payload)
    }
}

/// The raw form fields of a client submission.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WireMessage {
    pub msg_type: String,
    pub msg_payload: Option<String>,
    pub target_path: Option<String>,
}

impl WireMessage {
    /// Extract the message fields from request parameters.
    pub fn from_params(params: &BTreeMap<String, String>) -> Result<Self> {
        let msg_type = params
            .get(MSG_TYPE_PARAM)
            .cloned()
            .ok_or_else(|| StateError::malformed("", format!("missing '{}'", MSG_TYPE_PARAM)))?;

        Ok(Self {
            msg_type,
            msg_payload: params.get(MSG_PAYLOAD_PARAM).cloned(),
            target_path: params
                .get(TARGET_PATH_PARAM)
                .filter(|p| !p.is_empty())
                .cloned(),
        })
    }

    /// Decode into a [`Message`].
    pub fn decode(&self) -> Result<Message> {
        Message::from_wire(&self.msg_type, self.msg_payload.as_deref())
    }
}
