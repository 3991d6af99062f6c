//! Contextual escaping for snippet output positions.
//!
//! Every user-supplied value lands in one of three positions: a single-quoted
//! JS string literal, an HTML attribute, or a URL query value. Escape for the
//! position, never for the value's origin.

use std::fmt::Write;

/// Escape a value for a single-quoted JavaScript string literal. Also guards
/// against `</script>` breaking out of the surrounding script element.
pub fn js_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '<' if chars.peek() == Some(&'/') => escaped.push_str("<\\"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape a value for an HTML attribute position.
pub fn html_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Percent-encode a URL query value.
pub fn query_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for chunk in url::form_urlencoded::byte_serialize(value.as_bytes()) {
        let _ = encoded.write_str(chunk);
    }
    encoded
}
