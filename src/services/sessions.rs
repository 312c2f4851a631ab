//! Per-session key-value state (visit counters), keyed by session token

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client};

use crate::error::{AppError, AppResult};

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Increment a per-session counter by one and return the value it held
    /// before (0 when the session has never set it).
    async fn increment(&self, session_id: &str, key: &str) -> AppResult<u64>;
}

/// Redis-backed sessions; every write refreshes the session expiry
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { conn, ttl_seconds })
    }

    fn key(session_id: &str, key: &str) -> String {
        format!("session:{}:{}", session_id, key)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn increment(&self, session_id: &str, key: &str) -> AppResult<u64> {
        let key = Self::key(session_id, key);
        let mut conn = self.conn.clone();

        let (current,): (u64,) = redis::pipe()
            .atomic()
            .cmd("INCR")
            .arg(&key)
            .cmd("EXPIRE")
            .arg(&key)
            .arg(self.ttl_seconds)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(current.saturating_sub(1))
    }
}

/// In-process sessions, for tests and single-node development
pub struct MemorySessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, (u64, Instant)>>,
}

impl MemorySessionStore {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_seconds),
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn increment(&self, session_id: &str, key: &str) -> AppResult<u64> {
        let now = Instant::now();
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AppError::Internal("Session store lock poisoned".to_string()))?;

        entries.retain(|_, (_, expires)| *expires > now);

        let entry = entries
            .entry(format!("{}:{}", session_id, key))
            .or_insert((0, now));
        let previous = entry.0;
        *entry = (previous + 1, now + self.ttl);

        Ok(previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counter_increments_per_session() {
        let store = MemorySessionStore::new(60);

        assert_eq!(store.increment("a", "num_visits").await.unwrap(), 0);
        assert_eq!(store.increment("a", "num_visits").await.unwrap(), 1);
        assert_eq!(store.increment("a", "num_visits").await.unwrap(), 2);

        // A new session starts over
        assert_eq!(store.increment("b", "num_visits").await.unwrap(), 0);
        assert_eq!(store.increment("a", "num_visits").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_expired_session_resets() {
        let store = MemorySessionStore::new(0);

        assert_eq!(store.increment("a", "num_visits").await.unwrap(), 0);
        assert_eq!(store.increment("a", "num_visits").await.unwrap(), 0);
    }
}
