//! Output formatting for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::processing::ConfigurationData;

/// Placeholder printed instead of secret values.
pub const REDACTED: &str = "[REDACTED]";

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Flat JSON object of the configuration; sections and nulls become `null`.
pub fn configuration_json(data: &ConfigurationData, show_values: bool) -> Value {
    let entries: Map<String, Value> = data
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Some(_) if !show_values => Value::String(REDACTED.to_string()),
                Some(v) => Value::String(v.to_string()),
                None => Value::Null,
            };
            (key.to_string(), value)
        })
        .collect();
    Value::Object(entries)
}

/// `key = value` lines; sections and nulls print the key alone.
pub fn configuration_lines(data: &ConfigurationData, show_values: bool) -> Vec<String> {
    data.iter()
        .map(|(key, value)| match value {
            Some(_) if !show_values => format!("{} = {}", key, REDACTED),
            Some(v) => format!("{} = {}", key, v),
            None => key.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> ConfigurationData {
        [
            ("Db".to_string(), None),
            ("Db:Password".to_string(), Some("hunter2".to_string())),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_configuration_lines_redact_by_default() {
        assert_eq!(configuration_lines(&data(), false), vec!["Db", "Db:Password = [REDACTED]"]);
        assert_eq!(configuration_lines(&data(), true), vec!["Db", "Db:Password = hunter2"]);
    }

    #[test]
    fn test_configuration_json() {
        let json = configuration_json(&data(), true);
        assert_eq!(json["Db"], Value::Null);
        assert_eq!(json["Db:Password"], Value::String("hunter2".to_string()));
    }

    #[test]
    fn test_print_json() {
        assert!(print_json(&configuration_json(&data(), false)).is_ok());
    }
}
