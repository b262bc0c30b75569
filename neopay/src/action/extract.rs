//! Extracts structured action JSON from free-form assistant output.
//!
//! Model replies wrap action JSON in markdown fences, prose, or both. The
//! scanner here finds the first balanced `{ ... }` object that parses,
//! ignoring braces inside string literals.

use crate::error::ExtractError;

use super::ActionDescriptor;

/// Find the first parseable JSON object embedded in `text`.
pub fn extract_json(text: &str) -> Result<serde_json::Value, ExtractError> {
    let cleaned = strip_fences(text);
    let bytes = cleaned.as_bytes();
    let mut start = 0;

    while let Some(offset) = cleaned[start..].find('{') {
        let open = start + offset;
        if let Some(end) = balanced_end(bytes, open) {
            if let Ok(value) = serde_json::from_str(&cleaned[open..=end]) {
                return Ok(value);
            }
        }
        start = open + 1;
    }

    Err(ExtractError::NoJson)
}

/// Extract and decode an [`ActionDescriptor`] from assistant output.
pub fn extract_action(text: &str) -> Result<ActionDescriptor, ExtractError> {
    let value = extract_json(text)?;
    serde_json::from_value(value).map_err(|e| ExtractError::NotAnAction(e.to_string()))
}

/// Drop markdown code-fence markers so fenced JSON scans cleanly.
fn strip_fences(text: &str) -> String {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim();
            !(trimmed.starts_with("```"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Index of the `}` closing the object opened at `open`, honoring string
/// literals and escapes. Returns `None` when the object never closes.
fn balanced_end(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if escaped {
            escaped = false;
            continue;
        }
        match b {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
