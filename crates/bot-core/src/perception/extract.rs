//! Parsers for the free-form text the VLM returns about screen crops.
//!
//! Every helper is pure and returns a typed error on unexpected input; the
//! caller decides whether a failed extraction aborts the turn or is skipped.

use crate::stats::NEUTRAL_EFFICACY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The reply was not (or did not contain) a JSON array of numbers.
    InvalidJson(String),
    /// A list entry could not be read as a non-negative integer.
    InvalidNumber(String),
    /// The reply had the wrong number of entries for the queried region.
    UnexpectedCount { expected: usize, got: usize },
    /// An expected labeled value never appeared in the reply.
    MissingValue(&'static str),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::InvalidJson(raw) => write!(f, "invalid json number list: {raw}"),
            ExtractError::InvalidNumber(tok) => write!(f, "invalid number: {tok:?}"),
            ExtractError::UnexpectedCount { expected, got } => {
                write!(f, "expected {expected} values, got {got}")
            }
            ExtractError::MissingValue(name) => write!(f, "missing value: {name}"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Parses a reply to "Extract all numbers as JSON list." — a ```json fenced
/// array, or a bare JSON array when the model skips the fence.
pub fn numbers_from_json_block(reply: &str) -> Result<Vec<u32>, ExtractError> {
    let body = match reply.find("```json") {
        Some(start) => {
            let rest = &reply[start + "```json".len()..];
            match rest.find("```") {
                Some(end) => &rest[..end],
                None => rest,
            }
        }
        None => reply,
    };
    let body = body.trim();

    serde_json::from_str::<Vec<u32>>(body)
        .map_err(|_| ExtractError::InvalidJson(truncate(body, 80)))
}

/// Parses a reply to "Extract all numbers as JSON list." and checks the entry
/// count against what the queried region shows.
pub fn numbers_from_json_block_exact(
    reply: &str,
    expected: usize,
) -> Result<Vec<u32>, ExtractError> {
    let values = numbers_from_json_block(reply)?;
    if values.len() != expected {
        return Err(ExtractError::UnexpectedCount {
            expected,
            got: values.len(),
        });
    }
    Ok(values)
}

/// Splits a "List numbers." reply into trimmed non-empty tokens
/// (newlines count as separators).
fn list_tokens(reply: &str) -> Vec<&str> {
    reply
        .split(['\n', ','])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

fn parse_token(token: &str) -> Result<u32, ExtractError> {
    token
        .trim_end_matches('.')
        .trim()
        .parse::<u32>()
        .map_err(|_| ExtractError::InvalidNumber(token.to_string()))
}

/// Parses the basic-elements weakness column: earth, water, fire, wind.
pub fn parse_basic_elements(reply: &str) -> Result<(u32, u32, u32, u32), ExtractError> {
    let tokens = list_tokens(reply);
    if tokens.len() < 4 {
        return Err(ExtractError::UnexpectedCount {
            expected: 4,
            got: tokens.len(),
        });
    }
    Ok((
        parse_token(tokens[0])?,
        parse_token(tokens[1])?,
        parse_token(tokens[2])?,
        parse_token(tokens[3])?,
    ))
}

/// Parses the higher-elements weakness column: time, space, mirage.
///
/// More than three entries means the model hallucinated values for a column
/// that only ever shows three; the whole column falls back to neutral.
pub fn parse_higher_elements(reply: &str) -> Result<(u32, u32, u32), ExtractError> {
    let tokens = list_tokens(reply);
    if tokens.len() > 3 {
        return Ok((NEUTRAL_EFFICACY, NEUTRAL_EFFICACY, NEUTRAL_EFFICACY));
    }
    if tokens.len() < 3 {
        return Err(ExtractError::UnexpectedCount {
            expected: 3,
            got: tokens.len(),
        });
    }
    Ok((
        parse_token(tokens[0])?,
        parse_token(tokens[1])?,
        parse_token(tokens[2])?,
    ))
}

/// Parses a circles-and-triangles column readout ("1,0,0,1,1") into flags.
pub fn parse_binary_flags<const N: usize>(reply: &str) -> Result<[bool; N], ExtractError> {
    let tokens = list_tokens(reply);
    if tokens.len() < N {
        return Err(ExtractError::UnexpectedCount {
            expected: N,
            got: tokens.len(),
        });
    }
    let mut flags = [false; N];
    for (slot, token) in flags.iter_mut().zip(tokens.iter()) {
        *slot = parse_token(token)? != 0;
    }
    Ok(flags)
}

/// Strict yes/no: periods stripped, case-insensitive equality with "yes".
pub fn parse_yes_no(reply: &str) -> bool {
    reply.replace('.', "").trim().eq_ignore_ascii_case("yes")
}

/// Loose yes detection for replies that tend to come back as a sentence.
pub fn answer_contains_yes(reply: &str) -> bool {
    reply.to_ascii_lowercase().contains("yes")
}

/// HP/EP/CP values read from a party member's pool readout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReadout {
    pub hp: Option<u32>,
    pub ep: Option<u32>,
    pub cp: Option<u32>,
}

impl PoolReadout {
    pub fn require(self) -> Result<(u32, u32, u32), ExtractError> {
        Ok((
            self.hp.ok_or(ExtractError::MissingValue("hp"))?,
            self.ep.ok_or(ExtractError::MissingValue("ep"))?,
            self.cp.ok_or(ExtractError::MissingValue("cp"))?,
        ))
    }
}

/// Parses a "name,value" CSV readout of HP/EP/CP. Only short lines that
/// actually contain a comma count; everything else is model chatter.
pub fn parse_pool_readout(reply: &str) -> PoolReadout {
    let mut pools = PoolReadout::default();
    for line in reply.lines() {
        if line.len() > 20 || !line.contains(',') {
            continue;
        }
        let lower = line.to_ascii_lowercase();
        let value = line
            .rsplit(',')
            .next()
            .and_then(|v| v.trim().parse::<u32>().ok());
        let Some(value) = value else {
            continue;
        };
        if lower.contains("hp") {
            pools.hp = Some(value);
        } else if lower.contains("ep") {
            pools.ep = Some(value);
        } else if lower.contains("cp") {
            pools.cp = Some(value);
        }
    }
    pools
}

/// Parses a two-line "Strength: N / Defense: M" style readout. The first line
/// mentioning `first_label` supplies the first value, `second_label` the second.
pub fn parse_stat_pair(
    reply: &str,
    first_label: &'static str,
    second_label: &'static str,
) -> Result<(u32, u32), ExtractError> {
    let mut first = None;
    let mut second = None;
    for line in reply.to_ascii_lowercase().lines() {
        let Some((label, value)) = line.rsplit_once(':') else {
            continue;
        };
        let Ok(value) = value.trim().trim_end_matches('.').parse::<u32>() else {
            continue;
        };
        if label.contains(first_label) && first.is_none() {
            first = Some(value);
        } else if label.contains(second_label) && second.is_none() {
            second = Some(value);
        }
    }
    Ok((
        first.ok_or(ExtractError::MissingValue(first_label))?,
        second.ok_or(ExtractError::MissingValue(second_label))?,
    ))
}

/// Parses a bare-number reply ("What number is it?").
pub fn parse_single_number(reply: &str) -> Result<u32, ExtractError> {
    parse_token(reply.trim())
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
