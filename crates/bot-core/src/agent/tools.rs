//! OpenAI-compatible tool definitions for the combat actions.

use serde_json::{json, Value};

fn targeted_tool(name: &str, description: &str) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": {
                "type": "object",
                "properties": {
                    "enemy_id": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Target enemy ID."
                    }
                },
                "required": ["enemy_id"]
            }
        }
    })
}

fn plain_tool(name: &str, description: &str) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": {
                "type": "object",
                "properties": {}
            }
        }
    })
}

/// The full tool surface offered to the reasoner each turn.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        targeted_tool("attack", "Basic attack."),
        targeted_tool("use_art", "Use art attack."),
        targeted_tool("use_craft", "Use craft attack."),
        plain_tool("use_item", "Use item from the inventory."),
        plain_tool(
            "defend",
            "Decrease damage for this character until it's next turn instead of attacking.",
        ),
    ]
}
