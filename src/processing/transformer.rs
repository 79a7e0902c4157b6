//! Key transformers applied to every flattened key.

use std::fmt;
use std::sync::Arc;

use super::tokenizer::DEFAULT_KEY_DELIMITER;

/// A pure rewrite of a configuration key.
pub trait KeyTransformer: Send + Sync {
    fn transform(&self, key: &str) -> String;
}

impl<F> KeyTransformer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn transform(&self, key: &str) -> String {
        self(key)
    }
}

/// Replaces every `__` with the hierarchical delimiter, so `App__Db__Host`
/// becomes `App:Db:Host`.
#[derive(Debug, Clone)]
pub struct KeyDelimiterTransformer {
    delimiter: String,
}

impl Default for KeyDelimiterTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_DELIMITER)
    }
}

impl KeyDelimiterTransformer {
    const PATTERN: &'static str = "__";

    pub fn new(delimiter: impl Into<String>) -> Self {
        Self { delimiter: delimiter.into() }
    }
}

impl KeyTransformer for KeyDelimiterTransformer {
    fn transform(&self, key: &str) -> String {
        key.replace(Self::PATTERN, &self.delimiter)
    }
}

/// Ordered list of transformers; the output of one feeds the next.
#[derive(Clone, Default)]
pub struct KeyTransformerChain {
    transformers: Vec<Arc<dyn KeyTransformer>>,
}

impl fmt::Debug for KeyTransformerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyTransformerChain").field("len", &self.transformers.len()).finish()
    }
}

impl KeyTransformerChain {
    /// Chain with no transformers; keys pass through unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The default chain: a single [`KeyDelimiterTransformer`] for `delimiter`.
    pub fn with_delimiter(delimiter: &str) -> Self {
        let mut chain = Self::empty();
        chain.push(KeyDelimiterTransformer::new(delimiter));
        chain
    }

    pub fn push<T: KeyTransformer + 'static>(&mut self, transformer: T) -> &mut Self {
        self.transformers.push(Arc::new(transformer));
        self
    }

    pub fn push_shared(&mut self, transformer: Arc<dyn KeyTransformer>) -> &mut Self {
        self.transformers.push(transformer);
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.transformers.clear();
        self
    }

    pub fn replace(&mut self, transformers: Vec<Arc<dyn KeyTransformer>>) -> &mut Self {
        self.transformers = transformers;
        self
    }

    pub fn len(&self) -> usize {
        self.transformers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transformers.is_empty()
    }

    /// Runs `key` through every transformer in order.
    pub fn apply(&self, key: String) -> String {
        self.transformers.iter().fold(key, |key, t| t.transform(&key))
    }
}
