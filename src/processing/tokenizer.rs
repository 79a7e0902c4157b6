//! Flattening of value trees into delimited configuration keys.

use super::value::StructuredValue;

/// Default hierarchical key delimiter.
pub const DEFAULT_KEY_DELIMITER: &str = ":";

/// One flattened configuration entry. A `None` value marks a section or a JSON `null`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatEntry {
    pub key: String,
    pub value: Option<String>,
}

impl FlatEntry {
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self { key: key.into(), value }
    }
}

/// Turns a parsed value into an ordered stream of entries under a key prefix.
pub trait ConfigurationTokenizer<V>: Send + Sync {
    fn tokenize<'a>(
        &'a self,
        value: &'a V,
        prefix: &str,
    ) -> Box<dyn Iterator<Item = FlatEntry> + 'a>;
}

/// Tokenizer for [`StructuredValue`] trees.
///
/// Emission order is depth-first in declaration order. Every container with a
/// non-empty key yields a `None` section entry before its children; a root
/// container tokenized with an empty prefix yields only its children.
/// Booleans render as `True`/`False`.
#[derive(Debug, Clone)]
pub struct TreeTokenizer {
    delimiter: String,
}

impl Default for TreeTokenizer {
    fn default() -> Self {
        Self::with_delimiter(DEFAULT_KEY_DELIMITER)
    }
}

impl TreeTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        Self { delimiter: delimiter.into() }
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Lazy iterator over the entries of `value`.
    pub fn entries<'a>(&'a self, value: &'a StructuredValue, prefix: &str) -> Tokens<'a> {
        Tokens { delimiter: &self.delimiter, stack: vec![(prefix.to_string(), value)] }
    }
}

impl ConfigurationTokenizer<StructuredValue> for TreeTokenizer {
    fn tokenize<'a>(
        &'a self,
        value: &'a StructuredValue,
        prefix: &str,
    ) -> Box<dyn Iterator<Item = FlatEntry> + 'a> {
        Box::new(self.entries(value, prefix))
    }
}

/// Explicit-stack iterator returned by [`TreeTokenizer::entries`].
pub struct Tokens<'a> {
    delimiter: &'a str,
    stack: Vec<(String, &'a StructuredValue)>,
}

impl Tokens<'_> {
    fn join(&self, prefix: &str, segment: &str) -> String {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{}{}{}", prefix, self.delimiter, segment)
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = FlatEntry;

    fn next(&mut self) -> Option<FlatEntry> {
        while let Some((key, value)) = self.stack.pop() {
            match value {
                StructuredValue::Null => return Some(FlatEntry::new(key, None)),
                StructuredValue::Number(raw) => return Some(FlatEntry::new(key, Some(raw.clone()))),
                StructuredValue::String(s) => return Some(FlatEntry::new(key, Some(s.clone()))),
                StructuredValue::Bool(b) => {
                    let literal = if *b { "True" } else { "False" };
                    return Some(FlatEntry::new(key, Some(literal.to_string())));
                }
                StructuredValue::Object(properties) => {
                    // reversed so the first property is popped first
                    for (name, child) in properties.iter().rev() {
                        let child_key = self.join(&key, name);
                        self.stack.push((child_key, child));
                    }
                    if !key.is_empty() {
                        return Some(FlatEntry::new(key, None));
                    }
                }
                StructuredValue::Array(items) => {
                    for (index, child) in items.iter().enumerate().rev() {
                        let child_key = self.join(&key, &index.to_string());
                        self.stack.push((child_key, child));
                    }
                    if !key.is_empty() {
                        return Some(FlatEntry::new(key, None));
                    }
                }
            }
        }

        None
    }
}
