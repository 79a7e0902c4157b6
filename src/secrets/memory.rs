//! In-memory secret store for tests, demos and local development.
//!
//! Versions get random UUID ids. The newest version carries the
//! `AWSCURRENT` stage and the one before it `AWSPREVIOUS`, mirroring the
//! labels most managed stores use; custom stages can be pinned with
//! [`InMemorySecretStore::set_stage`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tracing::debug;

use super::client::SecretStore;
use super::error::{Result, SecretsError};
use super::types::{SecretRequest, SecretResponse, VersionSelector};

/// Stage label of the newest version.
pub const STAGE_CURRENT: &str = "AWSCURRENT";
/// Stage label of the version before the newest.
pub const STAGE_PREVIOUS: &str = "AWSPREVIOUS";

#[derive(Debug, Clone)]
enum StoredValue {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Default)]
struct StoredSecret {
    versions: Vec<(String, StoredValue)>,
    stages: HashMap<String, String>,
}

/// Versioned secrets kept in process memory.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<String, StoredSecret>>,
    requests: AtomicUsize,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new text version and return its id.
    pub fn put_string(&self, secret_id: &str, text: impl Into<String>) -> String {
        self.put(secret_id, StoredValue::Text(text.into()))
    }

    /// Store a new binary version (base64 text bytes) and return its id.
    pub fn put_binary(&self, secret_id: &str, bytes: impl Into<Vec<u8>>) -> String {
        self.put(secret_id, StoredValue::Binary(bytes.into()))
    }

    /// Replace the body of an existing version, keeping its id.
    ///
    /// Returns `false` when the version does not exist.
    pub fn overwrite_version(&self, secret_id: &str, version_id: &str, text: impl Into<String>) -> bool {
        let mut secrets = self.secrets.write().unwrap_or_else(PoisonError::into_inner);
        let Some(secret) = secrets.get_mut(secret_id) else {
            return false;
        };
        match secret.versions.iter_mut().find(|(id, _)| id == version_id) {
            Some((_, value)) => {
                *value = StoredValue::Text(text.into());
                true
            }
            None => false,
        }
    }

    /// Point `stage` at an existing version. Returns `false` when it does not exist.
    pub fn set_stage(&self, secret_id: &str, stage: &str, version_id: &str) -> bool {
        let mut secrets = self.secrets.write().unwrap_or_else(PoisonError::into_inner);
        let Some(secret) = secrets.get_mut(secret_id) else {
            return false;
        };
        if !secret.versions.iter().any(|(id, _)| id == version_id) {
            return false;
        }
        secret.stages.insert(stage.to_string(), version_id.to_string());
        true
    }

    /// Remove a secret with all its versions.
    pub fn remove(&self, secret_id: &str) -> bool {
        self.secrets.write().unwrap_or_else(PoisonError::into_inner).remove(secret_id).is_some()
    }

    /// Number of `get_secret_value` calls served so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn put(&self, secret_id: &str, value: StoredValue) -> String {
        let version_id = uuid::Uuid::new_v4().to_string();
        let mut secrets = self.secrets.write().unwrap_or_else(PoisonError::into_inner);
        let secret = secrets.entry(secret_id.to_string()).or_default();

        if let Some(current) = secret.stages.get(STAGE_CURRENT).cloned() {
            secret.stages.insert(STAGE_PREVIOUS.to_string(), current);
        }
        secret.stages.insert(STAGE_CURRENT.to_string(), version_id.clone());
        secret.versions.push((version_id.clone(), value));

        debug!(secret_name = %secret_id, version_id = %version_id, "Stored secret version in memory");
        version_id
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn get_secret_value(&self, request: &SecretRequest) -> Result<SecretResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let secrets = self.secrets.read().unwrap_or_else(PoisonError::into_inner);
        let secret = secrets
            .get(&request.secret_id)
            .ok_or_else(|| SecretsError::not_found(&request.secret_id))?;

        let version_id = match &request.version {
            VersionSelector::Latest => secret.stages.get(STAGE_CURRENT),
            VersionSelector::Id(id) => secret.versions.iter().map(|(v, _)| v).find(|v| *v == id),
            VersionSelector::Stage(stage) => secret.stages.get(stage),
        }
        .ok_or_else(|| {
            SecretsError::not_found(format!("{} ({})", request.secret_id, request.version))
        })?;

        let value = secret
            .versions
            .iter()
            .find(|(id, _)| id == version_id)
            .map(|(_, value)| value.clone())
            .ok_or_else(|| SecretsError::not_found(&request.secret_id))?;

        Ok(match value {
            StoredValue::Text(text) => SecretResponse::text(Some(version_id.clone()), text),
            StoredValue::Binary(bytes) => SecretResponse::binary(Some(version_id.clone()), bytes),
        })
    }
}
