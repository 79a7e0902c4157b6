//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use secrets_config::secrets::{
    InMemorySecretStore, Result, SecretRequest, SecretResponse, SecretStore, SecretsError,
};
use tokio::sync::Semaphore;

/// In-memory store whose calls can be held at a gate or made to fail.
#[derive(Debug)]
pub struct ControlledStore {
    inner: InMemorySecretStore,
    gated: AtomicBool,
    gate: Semaphore,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl ControlledStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: InMemorySecretStore::new(),
            gated: AtomicBool::new(false),
            gate: Semaphore::new(0),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn put(&self, secret_id: &str, text: &str) -> String {
        self.inner.put_string(secret_id, text)
    }

    pub fn overwrite(&self, secret_id: &str, version_id: &str, text: &str) -> bool {
        self.inner.overwrite_version(secret_id, version_id, text)
    }

    /// Hold every following call until [`release`](Self::release).
    pub fn hold(&self) {
        self.gated.store(true, Ordering::SeqCst);
    }

    /// Let one held call through.
    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    /// Stop holding new calls.
    pub fn open(&self) {
        self.gated.store(false, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for ControlledStore {
    fn backend_name(&self) -> &'static str {
        "controlled"
    }

    async fn get_secret_value(&self, request: &SecretRequest) -> Result<SecretResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.gated.load(Ordering::SeqCst) {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| SecretsError::backend_error(e.to_string()))?;
            permit.forget();
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(SecretsError::connection_failed("store unavailable"));
        }

        self.inner.get_secret_value(request).await
    }
}

/// Sample secret with a nested section and a number.
pub const DB_SECRET: &str = r#"{"Db":{"Host":"db.internal","Port":5432},"ApiKey":"k1"}"#;
