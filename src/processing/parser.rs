//! Secret text parsers.
//!
//! [`JsonParser`] accepts JSON objects and arrays only. Comments (`//` and
//! `/* */`) and trailing commas are tolerated, nesting is limited to
//! [`MAX_DEPTH`] containers.

use std::borrow::Cow;
use std::io::Read;

use json_comments::{CommentSettings, StripComments};

use super::value::StructuredValue;

/// Maximum container nesting accepted by [`JsonParser`].
pub const MAX_DEPTH: usize = 16;

/// Converts raw secret text into a value tree.
///
/// Implementations return `None` for anything they cannot parse; they never
/// panic and never report partial results.
pub trait SecretParser: Send + Sync {
    type Value;

    fn try_parse(&self, secret: &str) -> Option<Self::Value>;
}

/// Lenient JSON parser producing [`StructuredValue`] trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl JsonParser {
    pub fn new() -> Self {
        Self
    }
}

impl SecretParser for JsonParser {
    type Value = StructuredValue;

    fn try_parse(&self, secret: &str) -> Option<StructuredValue> {
        if !is_possibly_json_container(secret) {
            return None;
        }

        let normalized = normalize(secret)?;
        let value = StructuredValue::from_json_text(&normalized).ok()?;
        if !value.is_container() || value.depth() > MAX_DEPTH {
            return None;
        }

        Some(value)
    }
}

/// Cheap shape check run before the decoder: trimmed text must be wrapped in
/// `{}` or `[]`.
fn is_possibly_json_container(secret: &str) -> bool {
    let trimmed = secret.trim();
    if trimmed.len() < 2 {
        return false;
    }

    let bytes = trimmed.as_bytes();
    let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
    (first == b'{' && last == b'}') || (first == b'[' && last == b']')
}

/// Rewrites the relaxed syntax into strict JSON. Comments become whitespace,
/// so an unterminated block comment swallows the closing bracket and the
/// decoder rejects the result.
fn normalize(secret: &str) -> Option<Cow<'_, str>> {
    if !secret.contains('/') && !secret.contains(',') {
        return Some(Cow::Borrowed(secret));
    }

    let mut without_comments = String::with_capacity(secret.len());
    StripComments::with_settings(CommentSettings::c_style(), secret.as_bytes())
        .read_to_string(&mut without_comments)
        .ok()?;

    Some(Cow::Owned(strip_trailing_commas(&without_comments)))
}

/// Drops a comma that directly precedes `}` or `]` when it follows a value.
/// Commas after `{`, `[` or another comma are left for the decoder to reject.
fn strip_trailing_commas(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut last_significant: Option<char> = None;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                last_significant = Some('"');
            }
            continue;
        }

        if c == ',' {
            let closes = chars[i + 1..]
                .iter()
                .find(|n| !n.is_whitespace())
                .is_some_and(|n| *n == '}' || *n == ']');
            let follows_value = !matches!(last_significant, None | Some('{' | '[' | ','));
            if closes && follows_value {
                continue;
            }
        }

        if c == '"' {
            in_string = true;
        }
        if !c.is_whitespace() {
            last_significant = Some(c);
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Option<StructuredValue> {
        JsonParser::new().try_parse(text)
    }

    #[test]
    fn test_rejects_malformed_shapes() {
        for text in ["{", "[", "{]", "  ]  ", "", " ", "[}", "\"text\"", "42", "true", "null"] {
            assert!(parse(text).is_none(), "expected rejection of {:?}", text);
        }
    }

    #[test]
    fn test_rejects_invalid_json_with_valid_shape() {
        assert!(parse("{not json}").is_none());
        assert!(parse("{\"a\":}").is_none());
        assert!(parse("[1 2]").is_none());
    }

    #[test]
    fn test_parses_object_and_array_roots() {
        assert!(matches!(parse(r#"{"a":1}"#), Some(StructuredValue::Object(_))));
        assert!(matches!(parse("  [1, 2]\n"), Some(StructuredValue::Array(_))));
        assert_eq!(parse("{}"), Some(StructuredValue::Object(vec![])));
    }

    #[test]
    fn test_tolerates_comments() {
        let text = r#"{
            // connection settings
            "host": "db.internal", /* primary */
            "port": 5432
        }"#;
        let value = parse(text).unwrap();
        assert_eq!(
            value,
            StructuredValue::Object(vec![
                ("host".to_string(), StructuredValue::String("db.internal".to_string())),
                ("port".to_string(), StructuredValue::Number("5432".to_string())),
            ])
        );
    }

    #[test]
    fn test_comment_markers_inside_strings_are_kept() {
        let value = parse(r#"{"url":"https://example.com/*x*/","path":"a//b"}"#).unwrap();
        assert_eq!(
            value,
            StructuredValue::Object(vec![
                ("url".to_string(), StructuredValue::String("https://example.com/*x*/".to_string())),
                ("path".to_string(), StructuredValue::String("a//b".to_string())),
            ])
        );
    }

    #[test]
    fn test_comment_between_tokens() {
        assert_eq!(
            parse(r#"{"a":1/* first */,"b":2e1// last
            }"#),
            Some(StructuredValue::Object(vec![
                ("a".to_string(), StructuredValue::Number("1".to_string())),
                ("b".to_string(), StructuredValue::Number("2e1".to_string())),
            ]))
        );
    }

    #[test]
    fn test_rejects_unterminated_block_comment() {
        assert!(parse(r#"{"a":1 /* never closed }"#).is_none());
    }

    #[test]
    fn test_tolerates_trailing_commas() {
        assert_eq!(
            parse(r#"{"a":[1,2,],}"#),
            Some(StructuredValue::Object(vec![(
                "a".to_string(),
                StructuredValue::Array(vec![
                    StructuredValue::Number("1".to_string()),
                    StructuredValue::Number("2".to_string()),
                ])
            )]))
        );
        assert!(parse(r#"{"a":"x", // note
        }"#)
        .is_some());
    }

    #[test]
    fn test_rejects_misplaced_commas() {
        assert!(parse("[,]").is_none());
        assert!(parse("{,}").is_none());
        assert!(parse(r#"{"a":1,,}"#).is_none());
    }

    #[test]
    fn test_commas_inside_strings_are_kept() {
        let value = parse(r#"{"list":"a,}"}"#).unwrap();
        assert_eq!(
            value,
            StructuredValue::Object(vec![(
                "list".to_string(),
                StructuredValue::String("a,}".to_string())
            )])
        );
    }

    #[test]
    fn test_depth_limit() {
        let at_limit = format!("{}{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse(&at_limit).is_some());

        let too_deep = format!("{}{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(parse(&too_deep).is_none());
    }
}
