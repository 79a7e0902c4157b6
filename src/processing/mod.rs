//! # Secret Processing
//!
//! The synchronous half of the pipeline: secret text is parsed into a
//! [`StructuredValue`] tree, flattened into [`FlatEntry`] items, and every key
//! is rewritten by a [`KeyTransformerChain`] before landing in
//! [`ConfigurationData`].
//!
//! ```rust
//! use secrets_config::processing::{JsonSecretProcessor, ProcessingOptions, SecretProcessor};
//!
//! let processor = JsonSecretProcessor::json();
//! let options = ProcessingOptions::new("prod/db").with_key_prefix("Database");
//! let data = processor
//!     .get_configuration_data(&options, r#"{"Primary__Host": "db.internal"}"#)
//!     .unwrap();
//!
//! assert_eq!(data.get("Database:Primary:Host"), Some(Some("db.internal")));
//! ```

pub mod data;
pub mod parser;
pub mod processor;
pub mod tokenizer;
pub mod transformer;
pub mod value;

pub use data::ConfigurationData;
pub use parser::{JsonParser, SecretParser, MAX_DEPTH};
pub use processor::{JsonSecretProcessor, ParsingProcessor, ProcessingOptions, SecretProcessor};
pub use tokenizer::{ConfigurationTokenizer, FlatEntry, TreeTokenizer, DEFAULT_KEY_DELIMITER};
pub use transformer::{KeyDelimiterTransformer, KeyTransformer, KeyTransformerChain};
pub use value::StructuredValue;
