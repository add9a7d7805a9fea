//! Best-effort recovery of a JSON object from free-form model output.
//!
//! The span runs from the first `{` to the last `}` in the text and must parse
//! strictly as a JSON object. Nothing smarter is attempted: prose that contains
//! braces of its own (`the field {name} maps to ...`), or a reply carrying more
//! than one JSON fragment, widens the span and the parse fails. Callers get an
//! empty object in that case rather than an error.
//!
//! Numbers are kept exactly as written, so ids wider than 64 bits and
//! exponents outside the `f64` range survive. Nesting is accepted up to
//! [`MAX_NESTING_DEPTH`] levels.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::trace;

/// Deepest object/array nesting the extractor accepts.
pub const MAX_NESTING_DEPTH: usize = 1000;

/// Returns the object spanning the first `{` to the last `}` of `text`, or
/// `None` when there is no such span or it does not parse.
#[must_use]
pub fn try_extract_json(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    let span = &text[start..=end];
    let depth = nesting_depth(span);
    if depth > MAX_NESTING_DEPTH {
        trace!(depth, start, end, "candidate JSON span nested too deeply");
        return None;
    }

    match parse_object(span) {
        Ok(object) => Some(object),
        Err(err) => {
            trace!(%err, start, end, "candidate JSON span did not parse");
            None
        }
    }
}

/// Like [`try_extract_json`], degrading to an empty object.
#[must_use]
pub fn extract_json(text: &str) -> Map<String, Value> {
    try_extract_json(text).unwrap_or_default()
}

fn parse_object(span: &str) -> serde_json::Result<Map<String, Value>> {
    let mut de = serde_json::Deserializer::from_str(span);
    de.disable_recursion_limit();
    let object = Map::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(object)
}

/// Maximum bracket nesting outside string literals.
fn nesting_depth(span: &str) -> usize {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for byte in span.bytes() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    deepest
}
