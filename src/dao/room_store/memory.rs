use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval},
};
use tracing::debug;

use crate::dao::{room_store::RoomStore, storage::StorageResult};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// In-process store used when no Redis backend is configured, and by tests.
///
/// An entry past its deadline is dropped the next time it is read, or by the next
/// [`purge_expired`](Self::purge_expired) pass, whichever comes first.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    entries: Arc<DashMap<String, MemoryEntry>>,
}

impl MemoryRoomStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        purge(&self.entries)
    }

    /// Purge expired entries every `period` until the store is dropped.
    pub fn spawn_sweeper(&self, period: Duration) -> JoinHandle<()> {
        let entries = Arc::downgrade(&self.entries);
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(entries) = entries.upgrade() else {
                    break;
                };
                let purged = purge(&entries);
                if purged > 0 {
                    debug!(purged, remaining = entries.len(), "expired memory store entries purged");
                }
            }
        })
    }

    /// Number of stored entries, expired ones included.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Keys that are currently stored and not yet expired, sorted.
    pub fn live_keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    fn read(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        None
    }
}

fn purge(entries: &DashMap<String, MemoryEntry>) -> usize {
    let now = Instant::now();
    let before = entries.len();
    entries.retain(|_, entry| entry.expires_at > now);
    before.saturating_sub(entries.len())
}

impl RoomStore for MemoryRoomStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let value = self.read(key);
        Box::pin(async move { Ok(value) })
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> BoxFuture<'static, StorageResult<()>> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Box::pin(async { Ok(()) })
    }

    fn delete(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        self.entries.remove(key);
        Box::pin(async { Ok(()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_their_ttl() {
        let store = MemoryRoomStore::new();
        store
            .set("room:ABC123", "{}".into(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(store.get("room:ABC123").await.unwrap().as_deref(), Some("{}"));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.get("room:ABC123").await.unwrap(), None);
        assert!(store.live_keys().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn set_refreshes_the_ttl() {
        let store = MemoryRoomStore::new();
        store
            .set("score:ABC123:p1", "1000".into(), Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;
        store
            .set("score:ABC123:p1", "2000".into(), Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(
            store.get("score:ABC123:p1").await.unwrap().as_deref(),
            Some("2000")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn purge_drops_entries_that_are_never_read_again() {
        let store = MemoryRoomStore::new();
        store
            .set("tracks:ABC123:p1", "[]".into(), Duration::from_secs(1))
            .await
            .unwrap();
        store
            .set("room:XYZ789", "{}".into(), Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(store.entry_count(), 2);
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.entry_count(), 1);
        assert_eq!(store.live_keys(), vec!["room:XYZ789".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_reaps_abandoned_entries() {
        let store = MemoryRoomStore::new();
        let sweeper = store.spawn_sweeper(Duration::from_secs(10));
        store
            .set("score:ABC123:p1", "1000".into(), Duration::from_secs(5))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(store.entry_count(), 0);

        drop(store);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(sweeper.is_finished());
    }

    #[tokio::test]
    async fn deleting_an_absent_key_is_not_an_error() {
        let store = MemoryRoomStore::new();
        store.delete("questions:NOPE00").await.unwrap();
    }
}
