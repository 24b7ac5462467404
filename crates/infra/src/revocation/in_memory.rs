use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use amg_auth::{RevocationError, RevocationStore, TokenKey};

/// In-process revocation store for tests/dev.
///
/// Not shared between processes: a multi-instance deployment needs the
/// Redis adapter. Entries carry a deadline and are dropped once it passes.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    entries: Mutex<HashMap<TokenKey, Instant>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|m| m.values().filter(|d| **d > now).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn poisoned<T>(_: T) -> RevocationError {
    RevocationError::Unavailable("in-memory revocation store lock poisoned".to_string())
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, key: &TokenKey, ttl: Duration) -> Result<(), RevocationError> {
        let now = Instant::now();
        let deadline = now.checked_add(ttl).unwrap_or_else(|| now + FAR_FUTURE);

        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.retain(|_, d| *d > now);
        entries
            .entry(key.clone())
            .and_modify(|d| *d = (*d).max(deadline))
            .or_insert(deadline);
        Ok(())
    }

    async fn is_revoked(&self, key: &TokenKey) -> Result<bool, RevocationError> {
        let now = Instant::now();
        let mut entries = self.entries.lock().map_err(poisoned)?;

        match entries.get(key) {
            Some(deadline) if *deadline > now => Ok(true),
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }
}
