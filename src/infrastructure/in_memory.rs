use crate::domain::card::ErrorDisplay;
use crate::domain::ports::CredentialStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory credential store.
///
/// Uses `Arc<RwLock<HashMap<String, String>>>` so the application can log a
/// user in or out while checkouts read the token concurrently.
#[derive(Default, Clone)]
pub struct InMemoryCredentialStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryCredentialStore {
    /// Creates a new, empty credential store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut entries = self.entries.write().await;
        entries.insert(key.into(), value.into());
    }

    pub async fn remove(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.write().await;
        entries.remove(key)
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }
}

/// Reads credentials from environment variables at lookup time.
///
/// Key `access_token` with prefix `CHECKOUT` maps to `CHECKOUT_ACCESS_TOKEN`.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    prefix: String,
}

impl EnvCredentialStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_name(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, key).to_uppercase()
        }
    }
}

#[async_trait]
impl CredentialStore for EnvCredentialStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(std::env::var(self.variable_name(key)).ok())
    }
}

/// Error display backed by a string, for headless callers and tests.
#[derive(Default, Clone)]
pub struct InMemoryErrorDisplay {
    text: Arc<parking_lot::RwLock<String>>,
}

impl InMemoryErrorDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current content; empty when no error is shown.
    pub fn text(&self) -> String {
        self.text.read().clone()
    }
}

impl ErrorDisplay for InMemoryErrorDisplay {
    fn show(&self, message: &str) {
        *self.text.write() = message.to_string();
    }

    fn clear(&self) {
        self.text.write().clear();
    }
}
