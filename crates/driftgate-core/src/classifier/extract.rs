//! Structured-block extraction from classifier responses.
//!
//! Backends are asked for JSON only, but responses sometimes arrive wrapped
//! in surrounding prose. This module extracts the first balanced JSON
//! object from such text with an explicit, string- and escape-aware scan
//! rather than a regex heuristic.

use serde_json::Value;

/// Extract the first well-formed JSON object from `text`.
///
/// Tries a whole-text parse first, then scans for the first `{` and walks
/// to its balanced closing brace, ignoring braces inside string literals.
/// Returns a description of the failure if no parseable block exists.
pub fn extract_first_json_object(text: &str) -> Result<Value, String> {
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        if value.is_object() {
            return Ok(value);
        }
    }

    let bytes = text.as_bytes();
    let start = match text.find('{') {
        Some(i) => i,
        None => return Err("no opening brace in response".to_string()),
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escape_next = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    let candidate = &text[start..start + offset + 1];
                    return serde_json::from_str::<Value>(candidate)
                        .map_err(|e| format!("balanced block is not valid JSON: {e}"));
                }
            }
            _ => {}
        }
    }

    Err("unbalanced braces in response".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_bare_json() {
        let value = extract_first_json_object(r#"{"safe": true}"#).unwrap();
        assert_eq!(value["safe"], true);
    }

    #[test]
    fn test_extracts_json_wrapped_in_prose() {
        let text = "Here is my analysis:\n{\"resources\": []}\nLet me know if you need more.";
        let value = extract_first_json_object(text).unwrap();
        assert!(value["resources"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_handles_nested_objects() {
        let text = "prefix {\"a\": {\"b\": {\"c\": 1}}} suffix";
        let value = extract_first_json_object(text).unwrap();
        assert_eq!(value["a"]["b"]["c"], 1);
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"note {"msg": "a } brace and a { brace", "n": 2} done"#;
        let value = extract_first_json_object(text).unwrap();
        assert_eq!(value["n"], 2);
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let text = r#"{"msg": "she said \"hi}\" then left"}"#;
        let value = extract_first_json_object(text).unwrap();
        assert!(value["msg"].as_str().unwrap().contains("hi}"));
    }

    #[test]
    fn test_no_brace_is_an_error() {
        let err = extract_first_json_object("no structure here").unwrap_err();
        assert!(err.contains("no opening brace"));
    }

    #[test]
    fn test_unbalanced_is_an_error() {
        let err = extract_first_json_object("{\"a\": 1").unwrap_err();
        assert!(err.contains("unbalanced"));
    }

    #[test]
    fn test_top_level_array_falls_through_to_inner_object() {
        // A bare array is not the expected shape; the scan still finds the
        // first object inside it.
        let value = extract_first_json_object(r#"[{"a": 1}]"#).unwrap();
        assert_eq!(value["a"], 1);
    }
}
