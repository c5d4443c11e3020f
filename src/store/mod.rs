//! Snapshot persistence: an opaque binary key-value store with TTL and
//! prefix scan. Redis-backed in production, in-memory for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{info, warn};
use redis::AsyncCommands;

const GAME_KEY_PREFIX: &str = "game:";

/// Per-call timeout for store operations.
const STORE_TIMEOUT: Duration = Duration::from_secs(5);

const CONNECT_ATTEMPTS: u32 = 5;

#[derive(Clone)]
enum Backend {
    Redis(redis::aio::ConnectionManager),
    Memory(Arc<Mutex<HashMap<String, MemoryEntry>>>),
}

struct MemoryEntry {
    data: Vec<u8>,
    expires_at: Instant,
}

/// Game-state snapshot store.
#[derive(Clone)]
pub struct Store {
    backend: Backend,
}

impl Store {
    /// Connects to Redis at the given URL, retrying with backoff.
    pub async fn connect(url: &str) -> Result<Store, String> {
        let client =
            redis::Client::open(url).map_err(|e| format!("invalid redis URL {url:?}: {e}"))?;

        let mut last_err = String::new();
        for attempt in 0..CONNECT_ATTEMPTS {
            match client.get_connection_manager().await {
                Ok(manager) => {
                    info!("[Store] redis connected url={url}");
                    return Ok(Store { backend: Backend::Redis(manager) });
                }
                Err(e) => {
                    last_err = e.to_string();
                    warn!("[Store] redis connect attempt {} failed: {last_err}", attempt + 1);
                    actix_rt::time::sleep(Duration::from_secs(attempt as u64 + 1)).await;
                }
            }
        }
        Err(format!("failed to connect to redis after {CONNECT_ATTEMPTS} attempts: {last_err}"))
    }

    /// An in-memory store with the same TTL semantics, for tests and for
    /// running without persistence.
    pub fn memory() -> Store {
        Store { backend: Backend::Memory(Arc::new(Mutex::new(HashMap::new()))) }
    }

    /// Persists a serialized game state under `game:<id>` with the TTL.
    pub async fn save_game_state(
        &self,
        game_id: &str,
        data: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), String> {
        let key = format!("{GAME_KEY_PREFIX}{game_id}");
        match &self.backend {
            Backend::Redis(manager) => {
                let mut con = manager.clone();
                let fut = async move {
                    let _: () = con
                        .set_ex(&key, data, ttl.as_secs())
                        .await
                        .map_err(|e| e.to_string())?;
                    Ok(())
                };
                with_timeout(fut).await
            }
            Backend::Memory(map) => {
                let mut map = map.lock().map_err(|e| e.to_string())?;
                map.insert(key, MemoryEntry { data, expires_at: Instant::now() + ttl });
                Ok(())
            }
        }
    }

    /// Loads a snapshot; None if the key does not exist or has expired.
    pub async fn load_game_state(&self, game_id: &str) -> Result<Option<Vec<u8>>, String> {
        let key = format!("{GAME_KEY_PREFIX}{game_id}");
        match &self.backend {
            Backend::Redis(manager) => {
                let mut con = manager.clone();
                let fut = async move {
                    let value: Option<Vec<u8>> = con.get(&key).await.map_err(|e| e.to_string())?;
                    Ok(value)
                };
                with_timeout(fut).await
            }
            Backend::Memory(map) => {
                let map = map.lock().map_err(|e| e.to_string())?;
                Ok(map
                    .get(&key)
                    .filter(|entry| entry.expires_at > Instant::now())
                    .map(|entry| entry.data.clone()))
            }
        }
    }

    pub async fn delete_game_state(&self, game_id: &str) -> Result<(), String> {
        let key = format!("{GAME_KEY_PREFIX}{game_id}");
        match &self.backend {
            Backend::Redis(manager) => {
                let mut con = manager.clone();
                let fut = async move {
                    let _: () = con.del(&key).await.map_err(|e| e.to_string())?;
                    Ok(())
                };
                with_timeout(fut).await
            }
            Backend::Memory(map) => {
                map.lock().map_err(|e| e.to_string())?.remove(&key);
                Ok(())
            }
        }
    }

    /// All game ids with a live snapshot (prefix scan over `game:*`).
    pub async fn list_game_ids(&self) -> Result<Vec<String>, String> {
        match &self.backend {
            Backend::Redis(manager) => {
                let mut con = manager.clone();
                let fut = async move {
                    let keys: Vec<String> = con
                        .keys(format!("{GAME_KEY_PREFIX}*"))
                        .await
                        .map_err(|e| e.to_string())?;
                    Ok(keys
                        .into_iter()
                        .filter_map(|k| k.strip_prefix(GAME_KEY_PREFIX).map(str::to_string))
                        .collect())
                };
                with_timeout(fut).await
            }
            Backend::Memory(map) => {
                let now = Instant::now();
                let map = map.lock().map_err(|e| e.to_string())?;
                Ok(map
                    .iter()
                    .filter(|(_, entry)| entry.expires_at > now)
                    .filter_map(|(k, _)| k.strip_prefix(GAME_KEY_PREFIX).map(str::to_string))
                    .collect())
            }
        }
    }

    /// Verifies the store is reachable.
    pub async fn ping(&self) -> Result<(), String> {
        match &self.backend {
            Backend::Redis(manager) => {
                let mut con = manager.clone();
                let fut = async move {
                    let reply: String = redis::cmd("PING")
                        .query_async(&mut con)
                        .await
                        .map_err(|e| e.to_string())?;
                    if reply == "PONG" {
                        Ok(())
                    } else {
                        Err(format!("unexpected ping reply: {reply}"))
                    }
                };
                with_timeout(fut).await
            }
            Backend::Memory(_) => Ok(()),
        }
    }
}

async fn with_timeout<T>(
    fut: impl std::future::Future<Output = Result<T, String>>,
) -> Result<T, String> {
    match actix_rt::time::timeout(STORE_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(format!("store call timed out after {STORE_TIMEOUT:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_rt::test]
    async fn memory_store_round_trip() {
        let store = Store::memory();
        store
            .save_game_state("g1", b"payload".to_vec(), Duration::from_secs(60))
            .await
            .unwrap();

        let loaded = store.load_game_state("g1").await.unwrap();
        assert_eq!(loaded.as_deref(), Some(b"payload".as_ref()));
        assert!(store.load_game_state("missing").await.unwrap().is_none());

        let ids = store.list_game_ids().await.unwrap();
        assert_eq!(ids, vec!["g1".to_string()]);

        store.delete_game_state("g1").await.unwrap();
        assert!(store.load_game_state("g1").await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn expired_entries_are_invisible() {
        let store = Store::memory();
        store.save_game_state("g1", b"x".to_vec(), Duration::from_secs(0)).await.unwrap();
        assert!(store.load_game_state("g1").await.unwrap().is_none());
        assert!(store.list_game_ids().await.unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn ping_memory_always_succeeds() {
        assert!(Store::memory().ping().await.is_ok());
    }
}
