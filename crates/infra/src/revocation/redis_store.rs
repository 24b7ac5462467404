//! Redis-backed revocation store.
//!
//! Uses the two primitives the contract needs: `SET key value EX seconds`
//! and `GET key`. Expiry is left to Redis; nothing here polls.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use amg_auth::{RevocationError, RevocationStore, TokenKey};

const REVOKED_MARKER: &str = "revoked";

/// Revocation store over a multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisRevocationStore {
    pub async fn connect(
        redis_url: impl AsRef<str>,
        prefix: impl Into<String>,
    ) -> Result<Self, RevocationError> {
        let client = redis::Client::open(redis_url.as_ref()).map_err(unavailable)?;
        let conn = ConnectionManager::new(client).await.map_err(unavailable)?;
        let prefix = prefix.into();
        tracing::info!(prefix = %prefix, "connected to redis revocation store");
        Ok(Self {
            conn,
            prefix,
        })
    }

    fn redis_key(&self, key: &TokenKey) -> String {
        format!("{}{}", self.prefix, key.as_str())
    }
}

fn unavailable(e: redis::RedisError) -> RevocationError {
    RevocationError::Unavailable(e.to_string())
}

/// Redis `EX` takes whole seconds; round up so the entry never expires
/// before the token does.
pub(crate) fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    secs.max(1)
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, key: &TokenKey, ttl: Duration) -> Result<(), RevocationError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(self.redis_key(key))
            .arg(REVOKED_MARKER)
            .arg("EX")
            .arg(ttl_seconds(ttl))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }

    async fn is_revoked(&self, key: &TokenKey) -> Result<bool, RevocationError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(self.redis_key(key))
            .query_async(&mut conn)
            .await
            .map_err(unavailable)?;
        Ok(value.is_some())
    }
}
