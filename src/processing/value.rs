//! Structured value tree produced by parsers and consumed by tokenizers.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::value::RawValue;

/// A parsed secret document.
///
/// Objects keep their properties in declaration order and numbers keep the
/// exact text they were written with, so flattening never reorders keys or
/// reformats values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredValue {
    Null,
    /// Number in its source representation, e.g. `1.50` or `1e3`.
    Number(String),
    String(String),
    Bool(bool),
    Object(Vec<(String, StructuredValue)>),
    Array(Vec<StructuredValue>),
}

impl StructuredValue {
    /// Nesting depth of containers; scalars have depth 0, `{}` and `[]` have depth 1.
    pub fn depth(&self) -> usize {
        match self {
            StructuredValue::Object(properties) => {
                1 + properties.iter().map(|(_, value)| value.depth()).max().unwrap_or(0)
            }
            StructuredValue::Array(items) => {
                1 + items.iter().map(StructuredValue::depth).max().unwrap_or(0)
            }
            _ => 0,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, StructuredValue::Object(_) | StructuredValue::Array(_))
    }
}

impl StructuredValue {
    /// Parse strict JSON text, keeping every number exactly as written.
    ///
    /// # Errors
    ///
    /// The decoder error for text that is not a single JSON value.
    pub fn from_json_text(text: &str) -> serde_json::Result<Self> {
        let raw: &RawValue = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: &RawValue) -> serde_json::Result<Self> {
        let text = raw.get();
        match text.as_bytes().first() {
            Some(b'{') => {
                let RawObject(properties) = serde_json::from_str(text)?;
                properties
                    .into_iter()
                    .map(|(name, value)| Ok((name, Self::from_raw(value)?)))
                    .collect::<serde_json::Result<Vec<_>>>()
                    .map(StructuredValue::Object)
            }
            Some(b'[') => {
                let items: Vec<&RawValue> = serde_json::from_str(text)?;
                items
                    .into_iter()
                    .map(Self::from_raw)
                    .collect::<serde_json::Result<Vec<_>>>()
                    .map(StructuredValue::Array)
            }
            Some(b'"') => serde_json::from_str(text).map(StructuredValue::String),
            Some(b't' | b'f') => serde_json::from_str(text).map(StructuredValue::Bool),
            Some(b'n') => serde_json::from_str::<()>(text).map(|()| StructuredValue::Null),
            Some(_) => Ok(StructuredValue::Number(text.to_string())),
            None => Err(de::Error::custom("empty JSON value")),
        }
    }
}

/// Object members in declaration order with their values left undecoded.
struct RawObject<'a>(Vec<(String, &'a RawValue)>);

impl<'de> Deserialize<'de> for RawObject<'de> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RawObjectVisitor;

        impl<'de> Visitor<'de> for RawObjectVisitor {
            type Value = RawObject<'de>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut properties = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((name, value)) = map.next_entry::<String, &'de RawValue>()? {
                    properties.push((name, value));
                }
                Ok(RawObject(properties))
            }
        }

        deserializer.deserialize_map(RawObjectVisitor)
    }
}

/// Conversion from an already decoded document. Digits survive, but the
/// decoder has already normalised exponent spelling (`1e3` reads as `1e+3`);
/// use [`StructuredValue::from_json_text`] when the source text matters.
impl From<serde_json::Value> for StructuredValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => StructuredValue::Null,
            serde_json::Value::Bool(b) => StructuredValue::Bool(b),
            serde_json::Value::Number(n) => StructuredValue::Number(n.to_string()),
            serde_json::Value::String(s) => StructuredValue::String(s),
            serde_json::Value::Array(items) => {
                StructuredValue::Array(items.into_iter().map(StructuredValue::from).collect())
            }
            serde_json::Value::Object(map) => StructuredValue::Object(
                map.into_iter().map(|(key, value)| (key, StructuredValue::from(value))).collect(),
            ),
        }
    }
}
