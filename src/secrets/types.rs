//! Request, response and payload types exchanged with secret stores.
//!
//! Secret text travels in [`SecretString`], which redacts itself in `Debug`,
//! `Display` and serialization and zeroes its memory on drop.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string wrapper that redacts its contents in Debug, Display, and serialization.
///
/// The value is only reachable through [`SecretString::expose_secret`].
/// Deserialization accepts real values so tokens can come from settings files.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl SecretString {
    /// Creates a new SecretString from a string value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying secret value. Never log the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Returns the length of the secret without exposing the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Which version of a secret to fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum VersionSelector {
    /// The store's current version.
    #[default]
    Latest,
    /// An explicit version identifier.
    Id(String),
    /// A named stage label, such as `AWSPREVIOUS`.
    Stage(String),
}

impl VersionSelector {
    /// Builds a selector from optional settings values, `None` when both are set.
    pub fn from_parts(version_id: Option<String>, version_stage: Option<String>) -> Option<Self> {
        match (version_id, version_stage) {
            (Some(_), Some(_)) => None,
            (Some(id), None) => Some(Self::Id(id)),
            (None, Some(stage)) => Some(Self::Stage(stage)),
            (None, None) => Some(Self::Latest),
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => write!(f, "latest"),
            VersionSelector::Id(id) => write!(f, "id:{}", id),
            VersionSelector::Stage(stage) => write!(f, "stage:{}", stage),
        }
    }
}

/// A single secret lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretRequest {
    pub secret_id: String,
    pub version: VersionSelector,
}

impl SecretRequest {
    pub fn new(secret_id: impl Into<String>, version: VersionSelector) -> Self {
        Self { secret_id: secret_id.into(), version }
    }

    pub fn latest(secret_id: impl Into<String>) -> Self {
        Self::new(secret_id, VersionSelector::Latest)
    }
}

/// Raw store response. At most one of the payload fields is expected to be set.
#[derive(Debug, Clone, Default)]
pub struct SecretResponse {
    /// Version reported by the store, if it tracks versions.
    pub version_id: Option<String>,
    pub secret_string: Option<SecretString>,
    /// Binary payload holding base64 text of a UTF-8 document.
    pub secret_binary: Option<Vec<u8>>,
}

impl SecretResponse {
    pub fn text(version_id: Option<String>, text: impl Into<String>) -> Self {
        Self { version_id, secret_string: Some(SecretString::new(text)), secret_binary: None }
    }

    pub fn binary(version_id: Option<String>, bytes: Vec<u8>) -> Self {
        Self { version_id, secret_string: None, secret_binary: Some(bytes) }
    }
}

/// Normalised secret value handed to the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretPayload {
    pub version_id: String,
    pub value: SecretString,
}
