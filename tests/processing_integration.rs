//! Integration tests for secret processing
//!
//! Worked examples for the parse, flatten and transform pipeline plus a few
//! property tests over generated documents.

use proptest::prelude::*;
use secrets_config::processing::{
    ConfigurationData, JsonSecretProcessor, KeyTransformerChain, ProcessingOptions,
    SecretProcessor,
};
use secrets_config::ProviderError;

fn process(prefix: &str, secret: &str) -> Result<ConfigurationData, ProviderError> {
    JsonSecretProcessor::json()
        .get_configuration_data(&ProcessingOptions::new("test").with_key_prefix(prefix), secret)
}

fn entries(data: &ConfigurationData) -> Vec<(String, Option<String>)> {
    data.iter().map(|(k, v)| (k.to_string(), v.map(str::to_string))).collect()
}

#[test]
fn test_nested_arrays_use_indices() {
    let data = process("", r#"{"a":{"b":[1,2]}}"#).unwrap();

    assert_eq!(data.get("a:b:0"), Some(Some("1")));
    assert_eq!(data.get("a:b:1"), Some(Some("2")));
    assert_eq!(data.get("a"), Some(None));
    assert_eq!(data.get("a:b"), Some(None));
}

#[test]
fn test_sections_marked_under_prefix() {
    let data = process("P", r#"{"a":{"b":"x"}}"#).unwrap();
    assert_eq!(data.get("P"), Some(None));
    assert_eq!(data.get("P:a"), Some(None));
    assert_eq!(data.get("P:a:b"), Some(Some("x")));

    let data = process("", r#"{"a":{"b":"x"}}"#).unwrap();
    assert_eq!(data.get(""), None);
    assert_eq!(data.get("a"), Some(None));
    assert_eq!(data.get("a:b"), Some(Some("x")));
    assert_eq!(data.len(), 2);
}

#[test]
fn test_scalar_rendering() {
    let data = process(
        "",
        r#"{"x":true,"y":false,"n":null,"big":12345678901234567890.50,"exp":1e3,"s":"  spaced  "}"#,
    )
    .unwrap();

    assert_eq!(data.get("x"), Some(Some("True")));
    assert_eq!(data.get("y"), Some(Some("False")));
    assert_eq!(data.get("n"), Some(None));
    assert_eq!(data.get("big"), Some(Some("12345678901234567890.50")));
    assert_eq!(data.get("exp"), Some(Some("1e3")));
    assert_eq!(data.get("s"), Some(Some("  spaced  ")));
}

#[test]
fn test_exponent_spelling_is_kept() {
    let data = process("", r#"{"a":1e3,"b":1E5,"c":2.5E-3,"d":1.0e+2,"e":-0.000}"#).unwrap();

    assert_eq!(data.get("a"), Some(Some("1e3")));
    assert_eq!(data.get("b"), Some(Some("1E5")));
    assert_eq!(data.get("c"), Some(Some("2.5E-3")));
    assert_eq!(data.get("d"), Some(Some("1.0e+2")));
    assert_eq!(data.get("e"), Some(Some("-0.000")));
}

#[test]
fn test_top_level_array() {
    let data = process("Hosts", r#"["a","b"]"#).unwrap();
    assert_eq!(
        entries(&data),
        vec![
            ("Hosts".to_string(), None),
            ("Hosts:0".to_string(), Some("a".to_string())),
            ("Hosts:1".to_string(), Some("b".to_string())),
        ]
    );
}

#[test]
fn test_malformed_input_rejected() {
    for text in ["{", "[", "{]", "  ]  ", "", "plain", "\"string\"", "42", "{\"a\":1} x"] {
        let err = process("", text).unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }), "expected parse error for {:?}", text);
    }
}

#[test]
fn test_lenient_json() {
    let data = process(
        "",
        r#"{
            // connection settings
            "Host": "db", /* primary */
            "Ports": [1, 2,],
        }"#,
    )
    .unwrap();

    assert_eq!(data.get("Host"), Some(Some("db")));
    assert_eq!(data.get("Ports:1"), Some(Some("2")));
}

#[test]
fn test_default_transformer() {
    let data = process("", r#"{"App__Settings__Key":"v"}"#).unwrap();
    assert_eq!(entries(&data), vec![("App:Settings:Key".to_string(), Some("v".to_string()))]);
}

#[test]
fn test_flat_client_secret() {
    let data = process("", r#"{"ClientId":"abc","ClientSecret":"xyz"}"#).unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data.get("ClientId"), Some(Some("abc")));
    assert_eq!(data.get("ClientSecret"), Some(Some("xyz")));
}

#[test]
fn test_custom_delimiter() {
    let options = ProcessingOptions::new("test")
        .with_key_prefix("App")
        .with_key_transformers(KeyTransformerChain::with_delimiter("."));
    let data = JsonSecretProcessor::json_with_delimiter(".")
        .get_configuration_data(&options, r#"{"Db__Host":"h","Cache":{"Ttl":30}}"#)
        .unwrap();

    assert_eq!(data.get("App.Db.Host"), Some(Some("h")));
    assert_eq!(data.get("App.Cache.Ttl"), Some(Some("30")));
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9]{0,8}"
}

proptest! {
    #[test]
    fn test_flat_objects_keep_every_key(
        values in proptest::collection::btree_map(key_strategy(), "[ -~]{0,16}", 1..16)
    ) {
        let document = serde_json::to_string(&values).unwrap();
        let data = process("", &document).unwrap();

        // keys may collide case-insensitively
        let distinct: std::collections::BTreeSet<String> =
            values.keys().map(|k| k.to_lowercase()).collect();
        prop_assert_eq!(data.len(), distinct.len());

        for key in values.keys() {
            prop_assert!(data.contains_key(key));
        }
    }

    #[test]
    fn test_processing_is_deterministic(
        numbers in proptest::collection::vec(any::<i64>(), 0..12),
        prefix in "[A-Za-z]{0,6}",
    ) {
        let document = serde_json::json!({ "Items": numbers, "Count": numbers.len() }).to_string();

        let first = process(&prefix, &document).unwrap();
        let second = process(&prefix, &document).unwrap();
        prop_assert_eq!(&first, &second);

        let separator = if prefix.is_empty() { String::new() } else { format!("{}:", prefix) };
        for (index, number) in numbers.iter().enumerate() {
            let key = format!("{}Items:{}", separator, index);
            let expected = number.to_string();
            prop_assert_eq!(first.get(&key), Some(Some(expected.as_str())));
        }
    }
}
