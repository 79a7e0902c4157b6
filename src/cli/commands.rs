//! Command implementations

use std::future::Future;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::output::{configuration_json, configuration_lines, print_json};
use crate::config::{load_settings, AppSettings};
use crate::errors::ProviderError;
use crate::observability::{init_observability, log_settings_info};
use crate::processing::{
    ConfigurationData, JsonSecretProcessor, KeyTransformerChain, ProcessingOptions,
    SecretProcessor,
};
use crate::provider::SecretsConfigurationProvider;
use crate::secrets::store_from_settings;

/// Flatten `text` the way the provider would for a secret called `name`.
pub fn flatten_text(
    text: &str,
    name: &str,
    prefix: &str,
    delimiter: &str,
) -> crate::errors::Result<ConfigurationData> {
    if delimiter.is_empty() {
        return Err(ProviderError::config("Key delimiter cannot be empty"));
    }

    let options = ProcessingOptions::new(name)
        .with_key_prefix(prefix)
        .with_key_transformers(KeyTransformerChain::with_delimiter(delimiter));

    JsonSecretProcessor::json_with_delimiter(delimiter).get_configuration_data(&options, text)
}

/// `flatten` command
pub fn flatten(file: Option<&Path>, prefix: &str, delimiter: &str, json: bool) -> Result<()> {
    let (name, text) = match file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ProviderError::io(format!("reading {}", path.display()), e))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            (name, text)
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|e| ProviderError::io("reading stdin", e))?;
            ("stdin".to_string(), text)
        }
    };

    let data = flatten_text(&text, &name, prefix, delimiter)?;

    if json {
        print_json(&configuration_json(&data, true))?;
    } else {
        for line in configuration_lines(&data, true) {
            println!("{}", line);
        }
    }

    Ok(())
}

fn settings_for_cli(path: Option<&Path>, verbose: bool) -> Result<AppSettings> {
    let mut settings = load_settings(path).context("Failed to load settings")?;
    if verbose {
        settings.observability.log_level = "debug".to_string();
    }
    Ok(settings)
}

/// `fetch` command
pub async fn fetch(config: Option<&Path>, show_values: bool, verbose: bool) -> Result<()> {
    let mut settings = settings_for_cli(config, verbose)?;
    settings.watcher.enabled = false;

    init_observability(&settings.observability)?;
    log_settings_info(&settings);

    let store = store_from_settings(&settings.store).await?;
    let provider = SecretsConfigurationProvider::new(store, settings.provider_options()?);
    provider
        .load()
        .await
        .with_context(|| format!("Failed to load secret '{}'", provider.secret_name()))?;

    let data = provider.snapshot();
    println!("secret:  {}", provider.secret_name());
    println!("version: {}", provider.version_id().as_deref().unwrap_or("-"));
    println!("entries: {}", data.len());
    for line in configuration_lines(&data, show_values) {
        println!("  {}", line);
    }

    Ok(())
}

/// Log every configuration change of a loaded provider until `shutdown`
/// completes. Returns the number of changes seen.
pub async fn watch_changes<F>(provider: &SecretsConfigurationProvider, shutdown: F) -> u64
where
    F: Future<Output = ()>,
{
    let mut token = provider.reload_token();
    let mut changes = 0;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = token.changed() => {
                if !changed {
                    break;
                }
                changes += 1;
                info!(
                    secret_name = %provider.secret_name(),
                    version_id = %provider.version_id().unwrap_or_default(),
                    entries = provider.snapshot().len(),
                    "Configuration changed"
                );
            }
            _ = &mut shutdown => break,
        }
    }

    changes
}

/// `watch` command
pub async fn watch(config: Option<&Path>, verbose: bool) -> Result<()> {
    let mut settings = settings_for_cli(config, verbose)?;
    settings.watcher.enabled = true;

    init_observability(&settings.observability)?;
    log_settings_info(&settings);

    let store = store_from_settings(&settings.store).await?;
    let provider = SecretsConfigurationProvider::new(store, settings.provider_options()?);

    provider
        .load()
        .await
        .with_context(|| format!("Failed to load secret '{}'", provider.secret_name()))?;

    info!(
        secret_name = %provider.secret_name(),
        interval_seconds = settings.watcher.interval_seconds,
        "Watching secret for new versions, press Ctrl-C to stop"
    );

    watch_changes(&provider, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
        }
        info!("Received Ctrl-C, stopping watcher");
    })
    .await;

    provider.stop_watching();
    Ok(())
}
