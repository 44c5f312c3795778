use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::storage::{keys, KvStore};

/// Stable anonymous identity for a device. Generated once (UUIDv4),
/// persisted under a fixed key, and reused for every cart and group
/// operation until the user authenticates.
///
/// If durable storage fails, falls back to an identifier held in memory for
/// the lifetime of the process, so the id stays stable within a run even
/// when it cannot survive a restart.
pub struct SessionProvider {
    store: Arc<dyn KvStore>,
    fallback: Mutex<Option<String>>,
}

impl SessionProvider {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            fallback: Mutex::new(None),
        }
    }

    pub async fn session_id(&self) -> String {
        match self.store.get(keys::SESSION_ID).await {
            Ok(Some(id)) => return id,
            Ok(None) => {
                let id = Uuid::new_v4().to_string();
                match self.store.set(keys::SESSION_ID, &id).await {
                    Ok(()) => return id,
                    Err(e) => {
                        warn!(error = %e, "session storage write failed; using in-memory id");
                        return self.in_memory(Some(id)).await;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "session storage read failed; using in-memory id");
            }
        }
        self.in_memory(None).await
    }

    async fn in_memory(&self, candidate: Option<String>) -> String {
        let mut guard = self.fallback.lock().await;
        if let Some(existing) = guard.as_ref() {
            return existing.clone();
        }
        let id = candidate.unwrap_or_else(|| Uuid::new_v4().to_string());
        *guard = Some(id.clone());
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn session_id_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let provider = SessionProvider::new(store);
        let first = provider.session_id().await;
        let second = provider.session_id().await;
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }

    #[tokio::test]
    async fn clearing_storage_yields_a_new_id() {
        let store = Arc::new(MemoryStore::new());
        let provider = SessionProvider::new(Arc::clone(&store) as Arc<dyn KvStore>);
        let first = provider.session_id().await;
        store.remove(keys::SESSION_ID).await.unwrap();
        let second = provider.session_id().await;
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn separate_stores_get_separate_ids() {
        let a = SessionProvider::new(Arc::new(MemoryStore::new()));
        let b = SessionProvider::new(Arc::new(MemoryStore::new()));
        assert_ne!(a.session_id().await, b.session_id().await);
    }

    #[tokio::test]
    async fn broken_storage_falls_back_to_stable_in_memory_id() {
        struct BrokenStore;

        #[async_trait::async_trait]
        impl KvStore for BrokenStore {
            async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
                anyhow::bail!("storage unavailable")
            }
            async fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
                anyhow::bail!("storage unavailable")
            }
            async fn remove(&self, _key: &str) -> anyhow::Result<()> {
                anyhow::bail!("storage unavailable")
            }
        }

        let provider = SessionProvider::new(Arc::new(BrokenStore));
        let first = provider.session_id().await;
        let second = provider.session_id().await;
        assert_eq!(first, second);
    }
}
