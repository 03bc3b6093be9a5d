//! Utility functions for text cleanup and model-output handling.
//!
//! This module provides helper functions used throughout the application:
//! - Title normalization for topics coming from any source
//! - Code-fence stripping and JSON span extraction for model replies
//! - String truncation for logging

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```[a-z0-9_-]*").expect("valid regex"));

/// Collapse runs of whitespace to a single space and trim both ends.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(normalize_title("  a \n\t b  "), "a b");
/// ```
pub fn normalize_title(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Remove Markdown code-fence markers (```` ``` ````, ```` ```json ````, ```` ```html ````).
///
/// Only the markers are removed; the fenced content is kept and the result is
/// trimmed.
pub fn strip_code_fences(s: &str) -> String {
    CODE_FENCE.replace_all(s, "").trim().to_string()
}

/// Find the first balanced `{...}` or `[...]` span in `s`.
///
/// Brackets inside JSON string literals are ignored, so titles such as
/// `"C++ {templates}"` do not end the span early. Returns `None` when no
/// opening bracket exists or the span never closes.
pub fn extract_json_span(s: &str) -> Option<&str> {
    balanced_from(s, s.find(['{', '['])?)
}

/// Like [`extract_json_span`] but only a `{...}` object qualifies, so a
/// preamble such as `"[Article]"` is skipped.
pub fn extract_json_object(s: &str) -> Option<&str> {
    balanced_from(s, s.find('{')?)
}

fn balanced_from(s: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in s[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&s[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip fences from a model reply and parse the first JSON span in it.
pub fn parse_model_json(reply: &str) -> Result<serde_json::Value, String> {
    let cleaned = strip_code_fences(reply);
    let span = extract_json_span(&cleaned).ok_or_else(|| "no JSON object in reply".to_string())?;
    serde_json::from_str(span).map_err(|e| format!("invalid JSON in reply: {e}"))
}

/// Strip fences from a model reply and return its first JSON object.
///
/// `Err` carries the cleaned reply so callers can tell an object that never
/// closes from a reply with no object at all.
pub fn model_json_object(reply: &str) -> Result<String, String> {
    let cleaned = strip_code_fences(reply);
    match extract_json_object(&cleaned) {
        Some(span) => Ok(span.to_string()),
        None => Err(cleaned),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (rounded down to a character
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Take at most `max` characters from the front of `s`.
pub fn take_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the model response is cut off (e.g., due to token limits), the
/// resulting JSON will fail to parse with an EOF error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  Hello   World "), "Hello World");
        assert_eq!(normalize_title("a\n\tb"), "a b");
        assert_eq!(normalize_title("   "), "");
    }

    #[test]
    fn test_strip_code_fences() {
        let reply = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(reply), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```HTML<p>x</p>```"), "<p>x</p>");
    }

    #[test]
    fn test_extract_json_span_object() {
        let s = "Sure! Here it is: {\"title\": \"X\", \"q\": [1, 2]} hope that helps {}";
        assert_eq!(extract_json_span(s), Some("{\"title\": \"X\", \"q\": [1, 2]}"));
    }

    #[test]
    fn test_extract_json_span_array_first() {
        let s = "[{\"a\": 1}] and {\"b\": 2}";
        assert_eq!(extract_json_span(s), Some("[{\"a\": 1}]"));
    }

    #[test]
    fn test_extract_json_span_ignores_brackets_in_strings() {
        let s = r#"{"title": "C++ {templates} and \"quotes\" ]"}"#;
        assert_eq!(extract_json_span(s), Some(s));
    }

    #[test]
    fn test_extract_json_object_skips_bracketed_preamble() {
        let s = "[Article]\n{\"html\": \"<p>[1]</p>\"}";
        assert_eq!(extract_json_span(s), Some("[Article]"));
        assert_eq!(extract_json_object(s), Some("{\"html\": \"<p>[1]</p>\"}"));
        assert_eq!(extract_json_object("[1, 2]"), None);
    }

    #[test]
    fn test_model_json_object() {
        assert_eq!(
            model_json_object("```json\n[Note] {\"a\": 1}\n```").unwrap(),
            "{\"a\": 1}"
        );
        assert_eq!(model_json_object("```json\n{\"a\": ").unwrap_err(), "{\"a\":");
    }

    #[test]
    fn test_extract_json_span_unbalanced() {
        assert_eq!(extract_json_span("{\"a\": 1"), None);
        assert_eq!(extract_json_span("no json here"), None);
    }

    #[test]
    fn test_parse_model_json() {
        let v = parse_model_json("```json\n{\"title\": \"X\"}\n```").unwrap();
        assert_eq!(v["title"], "X");
        assert!(parse_model_json("plain words").is_err());
        assert!(parse_model_json("{not json}").is_err());
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte() {
        let s = "한국어 텍스트";
        let result = truncate_for_log(s, 4);
        assert!(result.starts_with("한"));
    }

    #[test]
    fn test_take_chars() {
        assert_eq!(take_chars("abcdef", 3), "abc");
        assert_eq!(take_chars("ab", 3), "ab");
        assert_eq!(take_chars("가나다라", 2), "가나");
    }

    #[test]
    fn test_looks_truncated() {
        let json_eof = r#"{"field": "value"#;
        let result: Result<serde_json::Value, _> = serde_json::from_str(json_eof);
        assert!(looks_truncated(&result.unwrap_err()));
    }
}
