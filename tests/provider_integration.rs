//! Integration tests for the load and refresh state machine
//!
//! These tests drive a provider against a controllable in-memory store and
//! check what reaches the configuration sink.

mod common;

use std::error::Error as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{ControlledStore, DB_SECRET};
use secrets_config::provider::{ignore_not_found, SecretOperation};
use secrets_config::{
    ConfigurationSink, ConfigurationStore, ProviderError, ProviderOptions, RefreshOutcome,
    SecretsConfigurationProvider,
};
use tokio::time::Instant;

fn provider(store: &Arc<ControlledStore>, options: ProviderOptions) -> Arc<SecretsConfigurationProvider> {
    SecretsConfigurationProvider::new(store.clone(), options)
}

#[tokio::test]
async fn test_load_publishes_flattened_secret() {
    let store = ControlledStore::new();
    let version = store.put("prod/db", DB_SECRET);

    let provider = provider(&store, ProviderOptions::builder("prod/db").build().unwrap());
    let token = provider.reload_token();
    provider.load().await.unwrap();

    assert!(provider.is_loaded());
    assert_eq!(provider.version_id(), Some(version));
    assert!(provider.loaded_at().is_some());
    assert!(token.has_changed());

    let data = provider.snapshot();
    assert_eq!(data.keys().collect::<Vec<_>>(), vec!["ApiKey", "Db", "Db:Host", "Db:Port"]);
    assert_eq!(provider.get("db:host").as_deref(), Some("db.internal"));
    assert_eq!(provider.sink().get("DB:PORT").as_deref(), Some("5432"));
    assert_eq!(provider.get("Db"), None);
}

#[tokio::test]
async fn test_load_with_prefix_and_custom_sink() {
    let store = ControlledStore::new();
    store.put("prod/db", DB_SECRET);

    let sink = Arc::new(ConfigurationStore::new());
    let options = ProviderOptions::builder("prod/db").key_prefix("Secrets").build().unwrap();
    let provider = SecretsConfigurationProvider::with_sink(store.clone(), options, sink.clone());
    provider.load().await.unwrap();

    assert_eq!(sink.generation(), 1);
    assert_eq!(sink.get("Secrets:Db:Host").as_deref(), Some("db.internal"));
    assert_eq!(sink.snapshot().get("Secrets"), Some(None));
}

#[tokio::test]
async fn test_load_twice_is_rejected() {
    let store = ControlledStore::new();
    store.put("app", r#"{"A":"1"}"#);

    let provider = provider(&store, ProviderOptions::builder("app").build().unwrap());
    provider.load().await.unwrap();

    let err = provider.load().await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidOperation { .. }));
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_mandatory_missing_secret_fails_load() {
    let store = ControlledStore::new();
    let provider = provider(&store, ProviderOptions::builder("missing").build().unwrap());

    let err = provider.load().await.unwrap_err();
    assert!(err.is_not_found());
    assert!(!provider.is_loaded());
    assert!(provider.snapshot().is_empty());
}

#[tokio::test]
async fn test_optional_secret_tolerates_any_failure() {
    let store = ControlledStore::new();
    let missing = provider(&store, ProviderOptions::builder("missing").optional(true).build().unwrap());
    missing.load().await.unwrap();
    assert!(missing.snapshot().is_empty());

    store.put("app", r#"{"A":"1"}"#);
    store.set_failing(true);
    let failing = provider(&store, ProviderOptions::builder("app").optional(true).build().unwrap());
    let token = failing.reload_token();
    failing.load().await.unwrap();

    assert!(!failing.is_loaded());
    assert!(!token.has_changed());
}

#[tokio::test]
async fn test_retrieval_failure_is_wrapped() {
    let store = ControlledStore::new();
    store.put("app", r#"{"A":"1"}"#);
    store.set_failing(true);

    let provider = provider(&store, ProviderOptions::builder("app").build().unwrap());
    let err = provider.load().await.unwrap_err();

    assert!(matches!(err, ProviderError::Retrieval { .. }));
    assert!(err.source().is_some());
}

#[tokio::test]
async fn test_unparseable_secret_fails_load() {
    let store = ControlledStore::new();
    store.put("token", "plain-text-token");

    let provider = provider(&store, ProviderOptions::builder("token").build().unwrap());
    let err = provider.load().await.unwrap_err();

    assert!(matches!(err, ProviderError::Retrieval { .. }));
    let cause = err.source().and_then(|e| e.downcast_ref::<ProviderError>());
    assert!(matches!(cause, Some(ProviderError::Parse { .. })));
}

#[tokio::test]
async fn test_load_exception_handler_can_ignore() {
    let store = ControlledStore::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_in_handler = seen.clone();

    let options = ProviderOptions::builder("missing")
        .on_load_exception(move |ctx| {
            assert_eq!(ctx.operation, SecretOperation::Load);
            assert_eq!(ctx.secret_name, "missing");
            assert!(!ctx.ignore);
            seen_in_handler.fetch_add(1, Ordering::SeqCst);
            ctx.ignore = ctx.error.is_not_found();
        })
        .build()
        .unwrap();

    provider(&store, options).load().await.unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_load_exception_handler_can_override_optional() {
    let store = ControlledStore::new();
    let options = ProviderOptions::builder("missing")
        .optional(true)
        .on_load_exception(|ctx| ctx.ignore = false)
        .build()
        .unwrap();

    assert!(provider(&store, options).load().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_startup_failure_delay() {
    let store = ControlledStore::new();
    let options = ProviderOptions::builder("missing")
        .startup_failure_delay(Duration::from_secs(10))
        .build()
        .unwrap();

    let started = Instant::now();
    assert!(provider(&store, options).load().await.is_err());
    assert!(started.elapsed() >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_ignored_failure_is_not_delayed() {
    let store = ControlledStore::new();
    let options = ProviderOptions::builder("missing")
        .optional(true)
        .startup_failure_delay(Duration::from_secs(10))
        .build()
        .unwrap();

    let started = Instant::now();
    provider(&store, options).load().await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_load_times_out() {
    let store = ControlledStore::new();
    store.put("app", r#"{"A":"1"}"#);
    store.hold();

    let options = ProviderOptions::builder("app").timeout(Duration::from_secs(5)).build().unwrap();
    let err = provider(&store, options).load().await.unwrap_err();

    assert!(matches!(err, ProviderError::Retrieval { .. }));
    let cause = err.source().and_then(|e| e.downcast_ref::<ProviderError>());
    assert!(matches!(cause, Some(ProviderError::Timeout { duration_ms: 5000, .. })));
}

#[tokio::test]
async fn test_refresh_applies_new_version() {
    let store = ControlledStore::new();
    let v1 = store.put("app", r#"{"A":"1","B":"2"}"#);

    let provider = provider(&store, ProviderOptions::builder("app").build().unwrap());
    provider.load().await.unwrap();

    let v2 = store.put("app", r#"{"A":"changed"}"#);
    let mut token = provider.reload_token();

    let outcome = provider.refresh().await.unwrap();
    assert_eq!(
        outcome,
        RefreshOutcome::Updated { previous_version_id: Some(v1), version_id: v2.clone() }
    );
    assert!(token.changed().await);
    assert_eq!(provider.get("a").as_deref(), Some("changed"));
    // whole snapshot replaced, no merging with the previous version
    assert_eq!(provider.get("B"), None);
    assert_eq!(provider.version_id(), Some(v2));
}

#[tokio::test]
async fn test_refresh_same_version_does_not_notify() {
    let store = ControlledStore::new();
    let v1 = store.put("app", r#"{"A":"1"}"#);

    let provider = provider(&store, ProviderOptions::builder("app").build().unwrap());
    provider.load().await.unwrap();
    let before = provider.snapshot();
    let token = provider.reload_token();

    assert_eq!(provider.refresh().await.unwrap(), RefreshOutcome::Unchanged { version_id: v1.clone() });
    assert_eq!(provider.refresh().await.unwrap(), RefreshOutcome::Unchanged { version_id: v1 });

    assert!(!token.has_changed());
    assert!(Arc::ptr_eq(&before, &provider.snapshot()));
}

#[tokio::test]
async fn test_version_equality_governs_not_content() {
    let store = ControlledStore::new();
    let v1 = store.put("app", r#"{"A":"1"}"#);

    let provider = provider(&store, ProviderOptions::builder("app").build().unwrap());
    provider.load().await.unwrap();
    let token = provider.reload_token();

    assert!(store.overwrite("app", &v1, r#"{"A":"rewritten"}"#));
    assert_eq!(provider.refresh().await.unwrap(), RefreshOutcome::Unchanged { version_id: v1 });

    assert!(!token.has_changed());
    assert_eq!(provider.get("A").as_deref(), Some("1"));
}

#[tokio::test]
async fn test_refresh_before_load_acts_as_load() {
    let store = ControlledStore::new();
    let v1 = store.put("app", r#"{"A":"1"}"#);

    let provider = provider(&store, ProviderOptions::builder("app").build().unwrap());
    let outcome = provider.refresh().await.unwrap();

    assert_eq!(outcome, RefreshOutcome::Updated { previous_version_id: None, version_id: v1 });
    assert_eq!(provider.get("A").as_deref(), Some("1"));
}

#[tokio::test]
async fn test_concurrent_refresh_is_skipped() {
    let store = ControlledStore::new();
    store.put("app", r#"{"A":"1"}"#);

    let provider = provider(&store, ProviderOptions::builder("app").build().unwrap());
    provider.load().await.unwrap();
    assert_eq!(store.calls(), 1);

    store.put("app", r#"{"A":"2"}"#);
    store.hold();

    let in_flight = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.refresh().await })
    };
    while store.calls() < 2 {
        tokio::task::yield_now().await;
    }

    assert_eq!(provider.refresh().await.unwrap(), RefreshOutcome::Skipped);
    assert_eq!(store.calls(), 2);

    store.release();
    let outcome = in_flight.await.unwrap().unwrap();
    assert!(matches!(outcome, RefreshOutcome::Updated { .. }));
    assert_eq!(provider.get("A").as_deref(), Some("2"));

    // the slot is free again once the first refresh finished
    store.open();
    assert!(matches!(provider.refresh().await.unwrap(), RefreshOutcome::Unchanged { .. }));
}

#[tokio::test]
async fn test_refresh_during_load_is_skipped() {
    let store = ControlledStore::new();
    let v1 = store.put("app", r#"{"A":"1"}"#);
    store.hold();

    let provider = provider(&store, ProviderOptions::builder("app").build().unwrap());
    let loading = {
        let provider = provider.clone();
        tokio::spawn(async move { provider.load().await })
    };
    while store.calls() < 1 {
        tokio::task::yield_now().await;
    }

    assert_eq!(provider.refresh().await.unwrap(), RefreshOutcome::Skipped);
    assert_eq!(store.calls(), 1);
    assert!(!provider.is_loaded());

    store.open();
    store.release();
    loading.await.unwrap().unwrap();
    assert_eq!(provider.version_id(), Some(v1.clone()));
    assert_eq!(provider.get("A").as_deref(), Some("1"));

    store.put("app", r#"{"A":"2"}"#);
    let outcome = provider.refresh().await.unwrap();
    assert!(matches!(outcome, RefreshOutcome::Updated { previous_version_id: Some(ref v), .. } if *v == v1));
    assert_eq!(provider.get("A").as_deref(), Some("2"));
}

#[tokio::test]
async fn test_refresh_failure_keeps_previous_snapshot() {
    let store = ControlledStore::new();
    store.put("app", r#"{"A":"1"}"#);

    let provider = provider(&store, ProviderOptions::builder("app").build().unwrap());
    provider.load().await.unwrap();

    store.put("app", "not json");
    let err = provider.refresh().await.unwrap_err();
    assert!(matches!(err, ProviderError::Parse { .. }));
    assert_eq!(provider.get("A").as_deref(), Some("1"));

    store.set_failing(true);
    assert!(matches!(provider.refresh().await, Err(ProviderError::Retrieval { .. })));
    assert_eq!(provider.get("A").as_deref(), Some("1"));
}

#[tokio::test]
async fn test_refresh_exception_handler() {
    let store = ControlledStore::new();
    store.put("app", r#"{"A":"1"}"#);

    let options = ProviderOptions::builder("app")
        .on_refresh_exception(|ctx| {
            assert_eq!(ctx.operation, SecretOperation::Refresh);
            ctx.ignore = true;
        })
        .build()
        .unwrap();
    let provider = provider(&store, options);
    provider.load().await.unwrap();

    store.set_failing(true);
    assert_eq!(provider.refresh().await.unwrap(), RefreshOutcome::FailureIgnored);
    assert_eq!(provider.get("A").as_deref(), Some("1"));
}

#[tokio::test]
async fn test_ignore_not_found_handler() {
    let store = ControlledStore::new();
    let handler = ignore_not_found();
    let options = ProviderOptions::builder("missing")
        .on_load_exception(move |ctx| handler(ctx))
        .build()
        .unwrap();

    provider(&store, options).load().await.unwrap();
}

#[tokio::test]
async fn test_key_transformer_chain_customisation() {
    let store = ControlledStore::new();
    store.put("app", r#"{"Service__Url":"http://svc"}"#);

    let options = ProviderOptions::builder("app")
        .key_transformer(|key: &str| key.replace("Url", "Endpoint"))
        .build()
        .unwrap();
    let provider = provider(&store, options);
    provider.load().await.unwrap();
    assert_eq!(provider.get("Service:Endpoint").as_deref(), Some("http://svc"));

    let options = ProviderOptions::builder("app").clear_key_transformers().build().unwrap();
    let raw = SecretsConfigurationProvider::new(store.clone(), options);
    raw.load().await.unwrap();
    assert_eq!(raw.get("Service__Url").as_deref(), Some("http://svc"));
}

#[tokio::test]
async fn test_pinned_version_stage() {
    let store = ControlledStore::new();
    store.put("app", r#"{"A":"old"}"#);
    store.put("app", r#"{"A":"new"}"#);

    let options = ProviderOptions::builder("app").version_stage("AWSPREVIOUS").build().unwrap();
    let provider = provider(&store, options);
    provider.load().await.unwrap();

    assert_eq!(provider.get("A").as_deref(), Some("old"));
}

#[test]
fn test_invalid_options_are_rejected() {
    assert!(matches!(ProviderOptions::builder("  ").build(), Err(ProviderError::Config { .. })));
    assert!(ProviderOptions::builder("app").timeout(Duration::ZERO).build().is_err());
    assert!(ProviderOptions::builder("app").key_delimiter("").build().is_err());
    assert!(ProviderOptions::builder("app").polling_watcher(Duration::ZERO).build().is_err());
}
