//! Cohere v2 chat stream fix-ups.
//!
//! Cohere content events may omit `content` or `content.text`; downstream
//! consumers expect both to be present.

use serde_json::{Map, Value};

use crate::json::is_truthy;

pub const CONTENT_EVENT_TYPES: [&str; 2] = ["content-start", "content-delta"];

pub fn is_content_event(event: &Value) -> bool {
    event
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|kind| CONTENT_EVENT_TYPES.contains(&kind))
}

/// Guarantees a string `content.text` on both `delta.message` and `message`
/// of content events. Other events are left untouched.
pub fn patch_content_event(event: &mut Value) {
    if !is_content_event(event) {
        return;
    }
    let Some(obj) = event.as_object_mut() else {
        return;
    };

    let has_message = obj.get("message").is_some_and(is_truthy);
    let has_delta_message = obj
        .get("delta")
        .and_then(|delta| delta.get("message"))
        .is_some_and(is_truthy);

    if !has_message && !has_delta_message {
        let delta = obj
            .entry("delta")
            .or_insert_with(|| Value::Object(Map::new()));
        if !delta.is_object() {
            *delta = Value::Object(Map::new());
        }
        if let Some(delta) = delta.as_object_mut() {
            delta.insert("message".to_string(), Value::Object(Map::new()));
        }
    }

    if let Some(message) = obj
        .get_mut("delta")
        .and_then(|delta| delta.get_mut("message"))
    {
        patch_message(message);
    }
    if let Some(message) = obj.get_mut("message") {
        patch_message(message);
    }
}

fn patch_message(message: &mut Value) {
    let Some(message) = message.as_object_mut() else {
        return;
    };
    match message.get_mut("content") {
        Some(content) if is_truthy(content) => {
            if let Some(content) = content.as_object_mut() {
                if !content.get("text").is_some_and(Value::is_string) {
                    content.insert("text".to_string(), Value::String(String::new()));
                }
            }
        }
        _ => {
            let mut content = Map::new();
            content.insert("text".to_string(), Value::String(String::new()));
            message.insert("content".to_string(), Value::Object(content));
        }
    }
}
