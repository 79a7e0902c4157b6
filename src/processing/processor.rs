//! Secret processors: parse, tokenize and transform in one call.

use std::fmt;

use super::data::ConfigurationData;
use super::parser::{JsonParser, SecretParser};
use super::tokenizer::{ConfigurationTokenizer, TreeTokenizer, DEFAULT_KEY_DELIMITER};
use super::transformer::KeyTransformerChain;
use crate::errors::{ProviderError, Result};

/// Inputs a processor needs besides the secret text.
#[derive(Debug, Clone)]
pub struct ProcessingOptions {
    /// Logical secret name, used in error messages.
    pub secret_name: String,
    /// Prefix placed in front of every key; empty puts keys at the root.
    pub key_prefix: String,
    pub key_transformers: KeyTransformerChain,
}

impl ProcessingOptions {
    /// Options with an empty prefix and the default transformer chain.
    pub fn new(secret_name: impl Into<String>) -> Self {
        Self {
            secret_name: secret_name.into(),
            key_prefix: String::new(),
            key_transformers: KeyTransformerChain::with_delimiter(DEFAULT_KEY_DELIMITER),
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_key_transformers(mut self, chain: KeyTransformerChain) -> Self {
        self.key_transformers = chain;
        self
    }
}

/// Converts secret text into configuration data.
///
/// Implementations must be pure: identical inputs give identical output.
pub trait SecretProcessor: Send + Sync {
    /// # Errors
    ///
    /// [`ProviderError::Parse`] when the secret text is not understood.
    fn get_configuration_data(
        &self,
        options: &ProcessingOptions,
        secret: &str,
    ) -> Result<ConfigurationData>;
}

/// Processor assembled from a parser and a tokenizer over the parser's output.
#[derive(Clone)]
pub struct ParsingProcessor<P, T> {
    parser: P,
    tokenizer: T,
}

impl<P, T> fmt::Debug for ParsingProcessor<P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsingProcessor")
            .field("parser", &std::any::type_name::<P>())
            .field("tokenizer", &std::any::type_name::<T>())
            .finish()
    }
}

impl<P, T> ParsingProcessor<P, T>
where
    P: SecretParser,
    T: ConfigurationTokenizer<P::Value>,
{
    pub fn new(parser: P, tokenizer: T) -> Self {
        Self { parser, tokenizer }
    }
}

impl<P, T> SecretProcessor for ParsingProcessor<P, T>
where
    P: SecretParser,
    T: ConfigurationTokenizer<P::Value>,
{
    fn get_configuration_data(
        &self,
        options: &ProcessingOptions,
        secret: &str,
    ) -> Result<ConfigurationData> {
        let value = self
            .parser
            .try_parse(secret)
            .ok_or_else(|| ProviderError::parse(options.secret_name.as_str()))?;

        let mut data = ConfigurationData::new();
        for entry in self.tokenizer.tokenize(&value, &options.key_prefix) {
            let key = options.key_transformers.apply(entry.key);
            data.insert(key, entry.value);
        }

        Ok(data)
    }
}

/// The default JSON processor.
pub type JsonSecretProcessor = ParsingProcessor<JsonParser, TreeTokenizer>;

impl JsonSecretProcessor {
    /// JSON processor joining keys with `:`.
    pub fn json() -> Self {
        Self::json_with_delimiter(DEFAULT_KEY_DELIMITER)
    }

    pub fn json_with_delimiter(delimiter: &str) -> Self {
        ParsingProcessor::new(JsonParser::new(), TreeTokenizer::with_delimiter(delimiter))
    }
}

impl Default for JsonSecretProcessor {
    fn default() -> Self {
        Self::json()
    }
}
