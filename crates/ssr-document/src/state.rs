//! Initial-state encoding for hydration.
//!
//! The encoded text is JSON with every character that could end an inline
//! `<script>` (or break a JavaScript source line) written as a `\uXXXX`
//! escape. It stays valid JSON, so decoding is a plain JSON parse.

use serde::Serialize;
use serde_json::Value;

/// Encoding of an empty object, used whenever encoding or decoding fails.
pub const EMPTY_STATE: &str = "{}";

/// Encodes application state for embedding and decodes it back.
///
/// Implementations must never fail: problems are logged and degrade to an
/// empty object.
pub trait StateCodec: Send + Sync {
    /// Encode state as text safe to place inside an inline script.
    fn encode(&self, state: &Value) -> String;

    /// Decode text produced by `encode`.
    fn decode(&self, text: &str) -> Value;
}

/// Default JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStateCodec;

impl StateCodec for JsonStateCodec {
    fn encode(&self, state: &Value) -> String {
        serialize_state(state)
    }

    fn decode(&self, text: &str) -> Value {
        deserialize_state(text)
    }
}

/// Serialize `state` for embedding in an inline script.
///
/// Falls back to `{}` (and logs) if serialization fails.
pub fn serialize_state<T: Serialize + ?Sized>(state: &T) -> String {
    match serde_json::to_string(state) {
        Ok(json) => escape_for_script(&json),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize initial state, embedding empty state");
            EMPTY_STATE.to_string()
        }
    }
}

/// Parse embedded state text.
///
/// Empty input or a parse failure yields an empty object (failures are
/// logged).
pub fn deserialize_state(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return empty_state();
    }

    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, state = text, "failed to deserialize initial state");
            empty_state()
        }
    }
}

fn empty_state() -> Value {
    Value::Object(Default::default())
}

/// Escape characters that are unsafe inside an inline script.
///
/// In serialized JSON these characters can only occur inside string
/// literals, where a `\uXXXX` escape is equivalent.
pub fn escape_for_script(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    for c in json.chars() {
        match c {
            '<' => escaped.push_str("\\u003C"),
            '>' => escaped.push_str("\\u003E"),
            '/' => escaped.push_str("\\u002F"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            c => escaped.push(c),
        }
    }
    escaped
}
