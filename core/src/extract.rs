//! Locating the JSON object inside free-form model output.
//!
//! Models wrap the requested JSON in prose or markdown fences more often than
//! not. Extraction tries, in order:
//!
//! 1. the body of a ```` ```json ```` fence (tag matched case-insensitively),
//! 2. the span from the first `{` to the last `}` inclusive.
//!
//! The brace span is greedy: two sibling objects separated by noise yield a
//! single candidate that fails to parse.

use std::sync::LazyLock;

use regex::Regex;

use inksolve_types::FlowError;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json[ \t]*\r?\n?(.*?)```").expect("valid JSON fence regex"));

/// Return the JSON candidate text, or [`FlowError::NoJsonFound`].
pub fn extract_json_candidate(raw: &str) -> Result<&str, FlowError> {
    if let Some(body) = JSON_FENCE
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| !body.is_empty())
    {
        return Ok(body);
    }

    let start = raw.find('{').ok_or(FlowError::NoJsonFound)?;
    let end = raw.rfind('}').ok_or(FlowError::NoJsonFound)?;
    if end < start {
        return Err(FlowError::NoJsonFound);
    }
    Ok(&raw[start..=end])
}
