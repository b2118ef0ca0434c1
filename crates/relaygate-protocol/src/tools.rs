//! The two tool declaration dialects spoken by the supported vendors.
//!
//! Gemini wraps declarations: `[{"functionDeclarations": [{name, description, parameters}]}]`.
//! OpenAI-compatible vendors (and Cohere v2) use a flat list:
//! `[{"type": "function", "function": {name, description, parameters}}]`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const FUNCTION_TOOL_TYPE: &str = "function";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object_schema")]
    pub parameters: Value,
}

/// Flat dialect entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDeclaration,
}

impl FunctionTool {
    pub fn new(function: FunctionDeclaration) -> Self {
        Self {
            kind: FUNCTION_TOOL_TYPE.to_string(),
            function,
        }
    }
}

/// Wrapped dialect entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclarationsTool {
    pub function_declarations: Vec<FunctionDeclaration>,
}

/// Parameter schema used when a declaration carries none.
pub fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        let tool = FunctionTool::new(FunctionDeclaration {
            name: "ls".to_string(),
            description: String::new(),
            parameters: empty_object_schema(),
        });
        assert_eq!(
            serde_json::to_value(&tool).unwrap(),
            json!({"type": "function", "function": {"name": "ls", "description": "", "parameters": {"type": "object", "properties": {}}}})
        );

        let wrapped: DeclarationsTool =
            serde_json::from_value(json!({"functionDeclarations": [{"name": "ls"}]})).unwrap();
        assert_eq!(wrapped.function_declarations[0].parameters, empty_object_schema());
    }
}
