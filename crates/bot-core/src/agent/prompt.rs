use crate::stats::TurnState;

/// Instruction appended to the turn context.
pub const GIVE_ORDER_PROMPT: &str = "It is your turn now. Give order to the active character.";

/// Suffix that tells Qwen-style models to skip chain-of-thought.
pub const NOTHINK_SUFFIX: &str = "/no_think";

/// Builds the user prompt for one turn: rendered stats plus the order
/// instruction, optionally with reasoning suppressed.
pub fn build_turn_prompt(turn: &TurnState, nothink: bool) -> String {
    let mut prompt = format!("{}\n\n{GIVE_ORDER_PROMPT}", turn.to_prompt());
    if nothink {
        prompt.push_str(NOTHINK_SUFFIX);
    }
    prompt
}

/// Strips the no-think suffix so a retry runs with reasoning enabled.
pub fn strip_nothink(prompt: &str) -> String {
    prompt
        .strip_suffix(NOTHINK_SUFFIX)
        .unwrap_or(prompt)
        .to_string()
}
