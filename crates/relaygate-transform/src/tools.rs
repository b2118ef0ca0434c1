use relaygate_protocol::tools::{
    DeclarationsTool, FUNCTION_TOOL_TYPE, FunctionDeclaration, FunctionTool, empty_object_schema,
};
use serde_json::Value;

/// True when every entry already carries a `type` field (flat dialect).
pub fn is_flat_dialect(entries: &[Value]) -> bool {
    entries.iter().all(has_type)
}

fn has_type(entry: &Value) -> bool {
    entry.get("type").is_some_and(|kind| !kind.is_null())
}

/// Wrapped (`functionDeclarations`) dialect to flat function tools.
///
/// Flat input is returned unchanged. Declarations without a name and wrappers
/// whose `functionDeclarations` is not a list are skipped. Non-list or empty
/// input yields an empty list.
pub fn to_function_tools(raw: &Value) -> Vec<Value> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };
    if entries.is_empty() {
        return Vec::new();
    }
    if is_flat_dialect(entries) {
        return entries.clone();
    }

    entries
        .iter()
        .filter_map(|entry| entry.get("functionDeclarations").and_then(Value::as_array))
        .flatten()
        .filter_map(read_declaration)
        .map(FunctionTool::new)
        .filter_map(|tool| serde_json::to_value(tool).ok())
        .collect()
}

/// Flat function tools to the wrapped dialect.
///
/// Wrapped input is returned unchanged. Entries without a `type` (native
/// Gemini tools such as `googleSearch`) are kept after the declarations
/// wrapper; flat entries of any other type are dropped.
pub fn to_function_declarations(raw: &Value) -> Vec<Value> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };
    if !entries.iter().any(has_type) {
        return entries.clone();
    }

    let mut declarations = Vec::new();
    let mut native = Vec::new();
    for entry in entries {
        if !has_type(entry) {
            native.push(entry.clone());
            continue;
        }
        if entry.get("type").and_then(Value::as_str) != Some(FUNCTION_TOOL_TYPE) {
            continue;
        }
        if let Some(declaration) = entry.get("function").and_then(read_declaration) {
            declarations.push(declaration);
        }
    }

    let mut out = Vec::with_capacity(native.len() + 1);
    if !declarations.is_empty() {
        let wrapped = DeclarationsTool {
            function_declarations: declarations,
        };
        if let Ok(value) = serde_json::to_value(wrapped) {
            out.push(value);
        }
    }
    out.extend(native);
    out
}

fn read_declaration(raw: &Value) -> Option<FunctionDeclaration> {
    let obj = raw.as_object()?;
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())?;
    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let parameters = obj
        .get("parameters")
        .filter(|parameters| parameters.is_object())
        .cloned()
        .unwrap_or_else(empty_object_schema);
    Some(FunctionDeclaration {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn wrapped_declarations_flatten_and_skip_unnamed() {
        let raw = json!([
            {"functionDeclarations": [
                {"name": "read_file", "description": "Read", "parameters": {"type": "object", "required": ["filepath"], "properties": {"filepath": {"type": "string"}}}},
                {"description": "no name"},
                {"name": ""},
                {"name": "view_diff"}
            ]},
            {"functionDeclarations": "not a list"},
            {"functionDeclarations": [{"name": "ls", "parameters": "bad"}]}
        ]);
        let tools = to_function_tools(&raw);
        assert_eq!(tools.len(), 3);
        assert_eq!(
            tools[0],
            json!({"type": "function", "function": {"name": "read_file", "description": "Read", "parameters": {"type": "object", "required": ["filepath"], "properties": {"filepath": {"type": "string"}}}}})
        );
        assert_eq!(tools[1]["function"]["description"], json!(""));
        assert_eq!(tools[1]["function"]["parameters"], empty_object_schema());
        assert_eq!(tools[2]["function"]["name"], json!("ls"));
        assert_eq!(tools[2]["function"]["parameters"], empty_object_schema());
    }

    #[test]
    fn flat_list_is_unchanged() {
        let raw = json!([
            {"type": "function", "function": {"name": "a", "extra": 1}},
            {"type": "custom", "anything": true}
        ]);
        assert_eq!(to_function_tools(&raw), raw.as_array().unwrap().clone());
    }

    #[test]
    fn empty_or_non_list_input() {
        assert!(to_function_tools(&json!([])).is_empty());
        assert!(to_function_tools(&json!({"functionDeclarations": []})).is_empty());
        assert!(to_function_tools(&Value::Null).is_empty());
        assert!(to_function_tools(&json!([null, 3])).is_empty());
    }

    #[test]
    fn flat_tools_wrap_into_declarations() {
        let raw = json!([
            {"type": "function", "function": {"name": "a", "description": "A", "parameters": {"type": "object", "properties": {"x": {"type": "string"}}}}},
            {"type": "function", "function": {"description": "nameless"}},
            {"type": "retrieval"},
            {"googleSearch": {}}
        ]);
        let tools = to_function_declarations(&raw);
        assert_eq!(
            tools,
            vec![
                json!({"functionDeclarations": [{"name": "a", "description": "A", "parameters": {"type": "object", "properties": {"x": {"type": "string"}}}}]}),
                json!({"googleSearch": {}})
            ]
        );
    }

    #[test]
    fn wrapped_tools_pass_through_reverse_direction() {
        let raw = json!([{"functionDeclarations": [{"name": "a"}]}]);
        assert_eq!(to_function_declarations(&raw), raw.as_array().unwrap().clone());
    }

    #[test]
    fn declarations_survive_both_directions() {
        let wrapped = json!([{"functionDeclarations": [
            {"name": "a", "description": "A", "parameters": {"type": "object", "properties": {}}},
            {"name": "b", "description": "B", "parameters": {"type": "object", "properties": {"items": {"type": "array", "items": {"type": "string"}}}}}
        ]}]);
        let flat = Value::Array(to_function_tools(&wrapped));
        assert_eq!(Value::Array(to_function_declarations(&flat)), wrapped);
    }
}
