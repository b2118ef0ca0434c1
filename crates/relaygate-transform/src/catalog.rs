//! Default agent-mode catalog: the system instruction and tool declarations
//! injected when a request carries none.

use serde_json::{Value, json};

pub const DEFAULT_SYSTEM_MESSAGE: &str = "You are an automated coding assistant operating in Agent mode. \nWhen a tool/function is required, produce a structured function call that matches the provided function schema.\nDo not output extra natural-language text outside the function call when a function call is required.\nWhen returning results of tool calls to the user, prefer concise, clear results and follow the tool descriptions exactly.";

/// System message plus tools in the wrapped `functionDeclarations` dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub system_message: String,
    pub tools: Value,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            system_message: DEFAULT_SYSTEM_MESSAGE.to_string(),
            tools: default_tools(),
        }
    }
}

impl Catalog {
    /// Built-in catalog with optional overrides; a tools override must be a list.
    pub fn with_overrides(system_message: Option<String>, tools: Option<Value>) -> Self {
        let mut catalog = Self::default();
        if let Some(system_message) = system_message.filter(|msg| !msg.trim().is_empty()) {
            catalog.system_message = system_message;
        }
        if let Some(tools) = tools.filter(Value::is_array) {
            catalog.tools = tools;
        }
        catalog
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.get("functionDeclarations").and_then(Value::as_array))
            .flatten()
            .filter_map(|decl| decl.get("name").and_then(Value::as_str))
            .collect()
    }
}

fn edits_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "required": ["old_string", "new_string"],
            "properties": {
                "old_string": {"type": "string"},
                "new_string": {"type": "string"},
                "replace_all": {"type": "boolean"}
            }
        }
    })
}

pub fn default_function_declarations() -> Value {
    json!([
        {
            "name": "read_file",
            "description": "Use this tool if you need to view the contents of an existing file.",
            "parameters": {
                "type": "object",
                "required": ["filepath"],
                "properties": {
                    "filepath": {
                        "type": "string",
                        "description": "The path of the file to read, relative to the root of the workspace (NOT uri or absolute path)"
                    }
                }
            }
        },
        {
            "name": "create_new_file",
            "description": "Create a new file. Only use this when a file doesn't exist and should be created",
            "parameters": {
                "type": "object",
                "required": ["filepath", "contents"],
                "properties": {
                    "filepath": {"type": "string", "description": "Relative path to the new file"},
                    "contents": {"type": "string", "description": "File contents to create"}
                }
            }
        },
        {
            "name": "run_terminal_command",
            "description": "Run a terminal command in the current directory. The shell is not stateful and will not remember previous commands. Choose commands optimized for darwin/arm64 and /bin/zsh.",
            "parameters": {
                "type": "object",
                "required": ["command"],
                "properties": {
                    "command": {"type": "string", "description": "The shell command to run"},
                    "waitForCompletion": {"type": "boolean", "description": "Whether to wait for completion (default true)"}
                }
            }
        },
        {
            "name": "file_glob_search",
            "description": "Search for files recursively in the project using glob patterns. Use targetted patterns to avoid large results.",
            "parameters": {
                "type": "object",
                "required": ["pattern"],
                "properties": {"pattern": {"type": "string", "description": "Glob pattern (supports **) "}}
            }
        },
        {
            "name": "view_diff",
            "description": "View the current diff of working changes",
            "parameters": {"type": "object", "properties": {}}
        },
        {
            "name": "read_currently_open_file",
            "description": "Read the currently open file in the IDE. If the user is referring to a file you can't see, ask first.",
            "parameters": {"type": "object", "properties": {}}
        },
        {
            "name": "ls",
            "description": "List files and folders in a given directory",
            "parameters": {
                "type": "object",
                "required": ["dirPath"],
                "properties": {
                    "dirPath": {"type": "string", "description": "Directory path relative to project root (e.g. '/')"},
                    "recursive": {"type": "boolean", "description": "If true, list recursively"}
                }
            }
        },
        {
            "name": "create_rule_block",
            "description": "Creates a rule that can be referenced in future conversations (code style, conventions, etc).",
            "parameters": {
                "type": "object",
                "required": ["name", "rule"],
                "properties": {
                    "name": {"type": "string", "description": "Short descriptive rule name"},
                    "rule": {"type": "string", "description": "Imperative instruction to apply in future generation"},
                    "description": {"type": "string", "description": "When to apply the rule (optional)"},
                    "globs": {"type": "array", "items": {"type": "string"}},
                    "regex": {"type": "string"},
                    "alwaysApply": {"type": "boolean"}
                }
            }
        },
        {
            "name": "fetch_url_content",
            "description": "View the contents of a website using a URL. Do NOT use this for files.",
            "parameters": {"type": "object", "required": ["url"], "properties": {"url": {"type": "string"}}}
        },
        {
            "name": "request_rule",
            "description": "Retrieve additional rules (by name) containing more context/instructions.",
            "parameters": {"type": "object", "required": ["name"], "properties": {"name": {"type": "string"}}}
        },
        {
            "name": "multi_edit",
            "description": "Make multiple edits to a single file. Edits are applied in sequence and must match exact old_string occurrences.",
            "parameters": {
                "type": "object",
                "required": ["filepath", "edits"],
                "properties": {"filepath": {"type": "string"}, "edits": edits_schema()}
            }
        },
        {
            "name": "grep_search",
            "description": "Perform a ripgrep search over the repo. Output may be truncated.",
            "parameters": {"type": "object", "required": ["query"], "properties": {"query": {"type": "string"}}}
        },
        {
            "name": "edit_existing_file",
            "description": "Edit an existing file (use read_file first to inspect).",
            "parameters": {
                "type": "object",
                "required": ["filepath", "edits"],
                "properties": {"filepath": {"type": "string"}, "edits": edits_schema()}
            }
        }
    ])
}

pub fn default_tools() -> Value {
    json!([{"functionDeclarations": default_function_declarations()}])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::to_function_tools;

    #[test]
    fn default_catalog_lists_every_tool() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.tool_names(),
            vec![
                "read_file",
                "create_new_file",
                "run_terminal_command",
                "file_glob_search",
                "view_diff",
                "read_currently_open_file",
                "ls",
                "create_rule_block",
                "fetch_url_content",
                "request_rule",
                "multi_edit",
                "grep_search",
                "edit_existing_file",
            ]
        );
        assert!(catalog.system_message.starts_with("You are an automated coding assistant"));
    }

    #[test]
    fn default_tools_flatten_completely() {
        let flat = to_function_tools(&default_tools());
        assert_eq!(flat.len(), 13);
        assert!(flat.iter().all(|tool| tool["type"] == "function"));
        assert_eq!(
            flat[10]["function"]["parameters"]["properties"]["edits"]["items"]["required"],
            json!(["old_string", "new_string"])
        );
    }

    #[test]
    fn overrides_replace_defaults() {
        let tools = json!([{"functionDeclarations": [{"name": "only"}]}]);
        let catalog = Catalog::with_overrides(Some("be brief".to_string()), Some(tools.clone()));
        assert_eq!(catalog.system_message, "be brief");
        assert_eq!(catalog.tools, tools);
    }

    #[test]
    fn blank_or_malformed_overrides_are_ignored() {
        let catalog = Catalog::with_overrides(Some("  ".to_string()), Some(json!({"not": "a list"})));
        assert_eq!(catalog, Catalog::default());
    }
}
