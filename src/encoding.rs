//! Result encoding for tool output.
//!
//! Every successful tool result is pretty-printed JSON, capped at
//! [`MAX_OUTPUT_BYTES`] bytes.

use crate::constants::{MAX_OUTPUT_BYTES, TRUNCATION_MARKER};
use crate::error::ServerError;
use serde::Serialize;
use tracing::debug;

/// Encode a result value as indented JSON and apply the output cap.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, ServerError> {
    let json = serde_json::to_string_pretty(value)?;
    Ok(truncate_output(json, MAX_OUTPUT_BYTES))
}

/// Cut `text` to at most `limit` bytes and append the truncation marker.
///
/// Text within the limit is returned unchanged. The cut backs off to the
/// nearest character boundary so the result stays valid UTF-8.
pub fn truncate_output(mut text: String, limit: usize) -> String {
    if text.len() <= limit {
        return text;
    }

    let mut cut = limit;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }

    debug!("Truncating {} byte result to {} bytes", text.len(), cut);
    text.truncate(cut);
    text.push_str(TRUNCATION_MARKER);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_indented() {
        let value = serde_json::json!([{"a": 1}]);
        assert_eq!(encode(&value).unwrap(), "[\n  {\n    \"a\": 1\n  }\n]");
    }

    #[test]
    fn test_encode_empty_list() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(encode(&empty).unwrap(), "[]");
    }

    #[test]
    fn test_under_limit_unchanged() {
        let text = "x".repeat(MAX_OUTPUT_BYTES);
        assert_eq!(truncate_output(text.clone(), MAX_OUTPUT_BYTES), text);
    }

    #[test]
    fn test_over_limit_truncated() {
        let text = "x".repeat(MAX_OUTPUT_BYTES + 1);
        let out = truncate_output(text, MAX_OUTPUT_BYTES);
        assert_eq!(out.len(), MAX_OUTPUT_BYTES + TRUNCATION_MARKER.len());
        assert!(out.ends_with(TRUNCATION_MARKER));
        assert!(out[..MAX_OUTPUT_BYTES].chars().all(|c| c == 'x'));
    }

    #[test]
    fn test_truncation_respects_char_boundary() {
        // "é" is two bytes; a limit of 3 falls inside the second one.
        let out = truncate_output("ééé".to_string(), 3);
        assert_eq!(out, format!("é{}", TRUNCATION_MARKER));
    }

    #[test]
    fn test_large_result_set_truncated() {
        let rows: Vec<_> = (0..2_000)
            .map(|i| serde_json::json!({ "id": i, "name": format!("row-{}", i) }))
            .collect();
        let out = encode(&rows).unwrap();
        assert_eq!(out.len(), MAX_OUTPUT_BYTES + TRUNCATION_MARKER.len());
        assert!(out.starts_with("[\n  {"));
    }
}
