//! Lenient recovery parser for tool-call arguments.
//!
//! Models occasionally emit argument blobs cut off mid-string by the token
//! limit, or with a dangling key and no value. Strict parsing is always
//! tried first; the repair pass only targets those truncation shapes and is
//! not a general JSON repair algorithm.

use serde_json::{Map, Value};

/// Parse a possibly-malformed argument blob into a key/value mapping.
///
/// Returns `None` when neither strict parsing nor the line-oriented repair
/// produces a valid object; the caller then treats the arguments as
/// unusable (an empty mapping), which is not fatal to the loop.
pub fn recover_arguments(raw: &str) -> Option<Map<String, Value>> {
    if let Ok(map) = serde_json::from_str::<Map<String, Value>>(raw) {
        return Some(map);
    }

    let repaired = repair_lines(raw)?;
    serde_json::from_str::<Map<String, Value>>(&repaired).ok()
}

/// Line-oriented repair for a truncated object literal.
fn repair_lines(raw: &str) -> Option<String> {
    let mut lines: Vec<String> = raw.lines().map(|l| l.trim_end().to_string()).collect();

    // Drop leading blank lines so the brace check sees real content
    while lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }

    let first = lines.first()?;
    if !first.trim_start().starts_with('{') {
        return None;
    }

    let has_closing_brace = lines.last().is_some_and(|l| l.trim().ends_with('}'));
    let repair_end = if has_closing_brace {
        lines.len() - 1
    } else {
        lines.len()
    };

    for line in &mut lines[..repair_end] {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed == "{" {
            continue;
        }
        if line.ends_with(',') {
            continue;
        }
        if line.ends_with(':') {
            // value was cut off entirely
            line.push_str(" \"\"");
        } else if !line.contains(':') {
            // dangling key
            line.push_str(": \"\"");
        } else if !line.ends_with('"') {
            // string value cut off mid-way
            line.push('"');
        }
    }

    if !has_closing_brace {
        lines.push("}".to_string());
    }

    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_json_parses_identically() {
        let raw = r#"{"query": "rust lang", "limit": 5}"#;
        let recovered = recover_arguments(raw).unwrap();
        let direct: Map<String, Value> = serde_json::from_str(raw).unwrap();
        assert_eq!(recovered, direct);
    }

    #[test]
    fn truncated_string_value_is_completed() {
        let recovered = recover_arguments(r#"{"q": "weather in "#).unwrap();
        assert!(recovered["q"].is_string());
        assert_eq!(recovered["q"], "weather in");
    }

    #[test]
    fn value_cut_after_colon_becomes_empty_string() {
        let raw = "{\n\"query\":\n";
        let recovered = recover_arguments(raw).unwrap();
        assert_eq!(recovered["query"], "");
    }

    #[test]
    fn dangling_key_gets_empty_value() {
        let raw = "{\n\"url\": \"https://example.com\",\n\"selector\"\n";
        let recovered = recover_arguments(raw).unwrap();
        assert_eq!(recovered["url"], "https://example.com");
        assert_eq!(recovered["selector"], "");
    }

    #[test]
    fn missing_opening_brace_is_rejected() {
        assert!(recover_arguments("\"query\": \"weather\"").is_none());
        assert!(recover_arguments("not json at all").is_none());
    }

    #[test]
    fn unrepairable_input_is_rejected() {
        // a number value gets a stray quote appended and still fails
        assert!(recover_arguments("{\n\"count\": 42\n\"more").is_none());
    }

    #[test]
    fn leading_blank_lines_are_tolerated() {
        let raw = "\n\n{\"q\": \"rust";
        let recovered = recover_arguments(raw).unwrap();
        assert_eq!(recovered["q"], "rust");
    }

    #[test]
    fn multi_line_object_with_commas_repairs() {
        let raw = "{\n  \"query\": \"weather oslo\",\n  \"lang\": \"en";
        let recovered = recover_arguments(raw).unwrap();
        assert_eq!(recovered["query"], "weather oslo");
        assert_eq!(recovered["lang"], "en");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(recover_arguments("").is_none());
        assert!(recover_arguments("   \n  ").is_none());
    }
}
