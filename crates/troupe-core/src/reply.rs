//! Structured-data extraction from free-text reasoning replies.
//!
//! Reasoning replies wrap their JSON in prose, in a fenced block, or send it
//! bare. [`extract_structured`] tries one strategy per shape, strictly in
//! order, and returns the first that parses:
//!
//! 1. the first code block fenced as ` ```json `
//! 2. the span from the first `{` or `[` to the last matching closer
//! 3. the whole reply
//!
//! A candidate that fails to parse falls through to the next strategy. There
//! is no default value: when every strategy fails the caller gets
//! [`ReplyError::Unparsable`] with a bounded prefix of the raw reply.

use serde_json::Value;

use crate::error::ReplyError;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Parses the structured payload out of a reasoning reply.
///
/// # Examples
///
/// ```rust
/// use troupe_core::reply::extract_structured;
///
/// let text = "Here is the analysis:\n```json\n{\"isSufficient\": true}\n```\nThanks!";
/// let value = extract_structured(text, 500).unwrap();
/// assert_eq!(value["isSufficient"], true);
///
/// let err = extract_structured("no data here", 4).unwrap_err();
/// assert!(err.to_string().contains("\"no d\""));
/// ```
pub fn extract_structured(text: &str, prefix_bound: usize) -> Result<Value, ReplyError> {
    let strategies: [(&str, fn(&str) -> Option<&str>); 3] = [
        ("fenced block", fenced_block),
        ("delimited span", delimited_span),
        ("whole reply", whole_reply),
    ];

    for (name, strategy) in strategies {
        let Some(candidate) = strategy(text) else {
            continue;
        };
        match serde_json::from_str(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => log::debug!("Reply strategy '{name}' did not parse: {e}"),
        }
    }

    Err(ReplyError::Unparsable {
        raw_prefix: text.chars().take(prefix_bound).collect(),
    })
}

/// Contents of the first ` ```json ` fenced block.
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find(JSON_FENCE)? + JSON_FENCE.len();
    let body = &text[start..];
    let end = body.find(FENCE)?;
    Some(body[..end].trim())
}

/// From the first opening delimiter to the last closer of the same kind.
fn delimited_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

fn whole_reply(text: &str) -> Option<&str> {
    Some(text.trim())
}
