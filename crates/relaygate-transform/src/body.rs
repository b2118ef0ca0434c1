use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

/// Inbound body, resolved once at the edge.
///
/// Anything that parses as a JSON object is `Json`; everything else (plain
/// text, non-object JSON, invalid UTF-8 decoded lossily) is kept as `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBody {
    Json(JsonObject),
    Text(String),
}

impl Default for RawBody {
    fn default() -> Self {
        RawBody::Text(String::new())
    }
}

impl RawBody {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let text = String::from_utf8_lossy(bytes);
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => RawBody::Json(map),
            _ => RawBody::Text(text.into_owned()),
        }
    }

    /// Empty object or whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            RawBody::Json(map) => map.is_empty(),
            RawBody::Text(text) => text.trim().is_empty(),
        }
    }

    /// Resolves the body into a mutable JSON object.
    ///
    /// Text that is a JSON object is used as such, text that is other JSON
    /// yields an empty object, and text that is not JSON at all is handed to
    /// `wrap_text` (providers turn it into a single user message).
    pub fn into_object(self, wrap_text: impl FnOnce(String) -> JsonObject) -> JsonObject {
        match self {
            RawBody::Json(map) => map,
            RawBody::Text(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => JsonObject::new(),
                Err(_) => wrap_text(text),
            },
        }
    }
}
