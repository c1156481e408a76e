//! Verification-code storage
//!
//! Registration confirms a one-time code sent by SMS. Codes are kept per
//! mobile number with a time-to-live; the in-memory store here serves a
//! single gateway instance.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

#[async_trait]
pub trait CodeCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, code: &str, ttl: Duration);

    /// Evicts expired entries. Stores with native expiry have nothing to do.
    async fn purge_expired(&self) {}
}

#[derive(Debug)]
struct Entry {
    code: String,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Default)]
pub struct InMemoryCodeCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryCodeCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodeCache for InMemoryCodeCache {
    async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(Utc::now()))
            .map(|entry| entry.code.clone())
    }

    async fn set(&self, key: &str, code: &str, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                code: code.to_string(),
                expires_at: Utc::now() + ttl,
            },
        );
    }

    async fn purge_expired(&self) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| !entry.is_expired(now));
    }
}
