use serde::{Deserialize, Serialize};

use crate::llm::{RawToolCall, ReasonerReply};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionParseError {
    /// The reply carried no tool call at all.
    NoToolCall,
    UnsupportedToolName(String),
    InvalidArguments(String),
}

impl std::fmt::Display for ActionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionParseError::NoToolCall => write!(f, "reply carried no tool call"),
            ActionParseError::UnsupportedToolName(name) => {
                write!(f, "unsupported tool name: {name}")
            }
            ActionParseError::InvalidArguments(msg) => write!(f, "invalid tool arguments: {msg}"),
        }
    }
}

impl std::error::Error for ActionParseError {}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct TargetArgs {
    pub enemy_id: usize,
}

/// The one order the reasoner gives per turn, decoded and validated.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum CombatAction {
    /// Basic attack; costs nothing, instant.
    Attack(TargetArgs),
    /// Art; consumes EP, delayed execution.
    UseArt(TargetArgs),
    /// Craft; consumes CP, instant.
    UseCraft(TargetArgs),
    /// Item from the inventory.
    UseItem,
    /// Guard until this character's next turn.
    Defend,
}

impl CombatAction {
    pub fn name(&self) -> &'static str {
        match self {
            CombatAction::Attack(_) => "attack",
            CombatAction::UseArt(_) => "use_art",
            CombatAction::UseCraft(_) => "use_craft",
            CombatAction::UseItem => "use_item",
            CombatAction::Defend => "defend",
        }
    }

    /// The enemy this action is aimed at, for actions that take a target.
    pub fn target(&self) -> Option<usize> {
        match self {
            CombatAction::Attack(args)
            | CombatAction::UseArt(args)
            | CombatAction::UseCraft(args) => Some(args.enemy_id),
            CombatAction::UseItem | CombatAction::Defend => None,
        }
    }
}

fn parse_args<T: for<'de> Deserialize<'de>>(
    val: serde_json::Value,
    tool_name: &'static str,
) -> Result<T, ActionParseError> {
    serde_json::from_value::<T>(val)
        .map_err(|e| ActionParseError::InvalidArguments(format!("{tool_name}: {e}")))
}

impl TryFrom<RawToolCall> for CombatAction {
    type Error = ActionParseError;

    fn try_from(call: RawToolCall) -> Result<Self, Self::Error> {
        let name = call.name.trim().to_ascii_lowercase();
        match name.as_str() {
            "attack" => Ok(CombatAction::Attack(parse_args(call.arguments, "attack")?)),
            "use_art" => Ok(CombatAction::UseArt(parse_args(call.arguments, "use_art")?)),
            "use_craft" => Ok(CombatAction::UseCraft(parse_args(
                call.arguments,
                "use_craft",
            )?)),
            "use_item" => Ok(CombatAction::UseItem),
            "defend" => Ok(CombatAction::Defend),
            other => Err(ActionParseError::UnsupportedToolName(other.to_string())),
        }
    }
}

/// Decodes the first tool call of a reasoner reply into a combat action.
pub fn action_from_reply(reply: &ReasonerReply) -> Result<CombatAction, ActionParseError> {
    let call = reply
        .tool_calls
        .first()
        .cloned()
        .ok_or(ActionParseError::NoToolCall)?;
    CombatAction::try_from(call)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply_with(name: &str, arguments: serde_json::Value) -> ReasonerReply {
        ReasonerReply {
            content: String::new(),
            tool_calls: vec![RawToolCall {
                name: name.to_string(),
                arguments,
            }],
        }
    }

    #[test]
    fn attack_decodes_with_target() {
        let action = action_from_reply(&reply_with("attack", json!({"enemy_id": 2}))).unwrap();
        assert_eq!(action, CombatAction::Attack(TargetArgs { enemy_id: 2 }));
        assert_eq!(action.target(), Some(2));
    }

    #[test]
    fn argless_tools_ignore_arguments() {
        let action = action_from_reply(&reply_with("defend", json!({}))).unwrap();
        assert_eq!(action, CombatAction::Defend);
        assert_eq!(action.target(), None);

        let action = action_from_reply(&reply_with("use_item", json!({"whatever": 1}))).unwrap();
        assert_eq!(action, CombatAction::UseItem);
    }

    #[test]
    fn tool_names_are_case_insensitive() {
        let action = action_from_reply(&reply_with("Use_Craft", json!({"enemy_id": 0}))).unwrap();
        assert_eq!(action.name(), "use_craft");
    }

    #[test]
    fn missing_target_is_invalid_arguments() {
        let err = action_from_reply(&reply_with("use_art", json!({}))).unwrap_err();
        assert!(matches!(err, ActionParseError::InvalidArguments(_)));
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let err = action_from_reply(&reply_with("flee", json!({}))).unwrap_err();
        assert_eq!(err, ActionParseError::UnsupportedToolName("flee".to_string()));
    }

    #[test]
    fn empty_reply_is_no_tool_call() {
        let err = action_from_reply(&ReasonerReply::default()).unwrap_err();
        assert_eq!(err, ActionParseError::NoToolCall);
    }

    #[test]
    fn only_the_first_tool_call_counts() {
        let reply = ReasonerReply {
            content: String::new(),
            tool_calls: vec![
                RawToolCall {
                    name: "defend".to_string(),
                    arguments: json!({}),
                },
                RawToolCall {
                    name: "attack".to_string(),
                    arguments: json!({"enemy_id": 0}),
                },
            ],
        };
        assert_eq!(action_from_reply(&reply).unwrap(), CombatAction::Defend);
    }
}
