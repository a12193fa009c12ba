//! Shared application state: configuration, the room store, the socket hub and the
//! per-room coordination primitives.

/// Per-room broadcast hub.
pub mod hub;
/// Orchestrator state machine.
pub mod quiz_machine;

use std::sync::Arc;

use dashmap::{DashMap, DashSet};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::{
    config::AppConfig,
    dao::{room::RoomRepository, room_store::RoomStore},
};

pub use self::hub::{ConnectionHandle, Hub};

/// Shared handle given to every handler and task.
pub type SharedState = Arc<AppState>;

type RoomLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Exclusive hold on one room, returned by [`AppState::lock_room`].
///
/// Dropping it releases the room and removes the lock entry once nobody else holds or
/// awaits it.
pub struct RoomGuard {
    guard: Option<OwnedMutexGuard<()>>,
    locks: RoomLocks,
    code: String,
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The map's own reference is the only one left when no task holds or awaits the lock.
        self.locks
            .remove_if(&self.code, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Central application state: configuration, the shared store, and the socket hub.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn RoomStore>,
    store_backend: &'static str,
    hub: Hub,
    room_locks: RoomLocks,
    running_quizzes: DashSet<String>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] and start the hub dispatcher.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: AppConfig, store: Arc<dyn RoomStore>, store_backend: &'static str) -> SharedState {
        Arc::new(Self {
            config,
            store,
            store_backend,
            hub: Hub::spawn(),
            room_locks: Arc::new(DashMap::new()),
            running_quizzes: DashSet::new(),
        })
    }

    /// Loaded application configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared handle to the raw key-value store.
    pub fn store(&self) -> Arc<dyn RoomStore> {
        self.store.clone()
    }

    /// Human-readable name of the installed store backend.
    pub fn store_backend(&self) -> &'static str {
        self.store_backend
    }

    /// Typed access to room records, writing with the configured TTL.
    pub fn repository(&self) -> RoomRepository {
        RoomRepository::new(self.store.clone(), self.config.record_ttl)
    }

    /// Broadcast hub fanning payloads out to the sockets of each room.
    pub fn hub(&self) -> &Hub {
        &self.hub
    }

    /// Serialize read-modify-write cycles on one room's records within this process.
    ///
    /// No other lock may be held while awaiting the guard.
    pub async fn lock_room(&self, code: &str) -> RoomGuard {
        let lock = self.room_locks.entry(code.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;
        RoomGuard {
            guard: Some(guard),
            locks: self.room_locks.clone(),
            code: code.to_string(),
        }
    }

    /// Number of rooms with a lock entry, held or awaited.
    pub fn room_lock_count(&self) -> usize {
        self.room_locks.len()
    }

    /// Mark an orchestrator as running for `code`. Returns `false` if one already is.
    pub fn claim_quiz(&self, code: &str) -> bool {
        self.running_quizzes.insert(code.to_string())
    }

    /// Forget the orchestrator of `code` once it has stopped.
    pub fn release_quiz(&self, code: &str) {
        self.running_quizzes.remove(code);
    }

    /// Whether an orchestrator currently drives `code`.
    pub fn is_quiz_running(&self, code: &str) -> bool {
        self.running_quizzes.contains(code)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::{sync::Arc, time::Duration};

    use super::{AppState, SharedState};
    use crate::{
        config::{AppConfig, QuizTimings},
        dao::room_store::MemoryRoomStore,
    };

    /// State over a fresh in-memory store with short, distinct quiz timers.
    pub fn memory_state() -> (SharedState, MemoryRoomStore) {
        let config = AppConfig {
            quiz: QuizTimings {
                warmup: Duration::from_secs(2),
                answer_window: Duration::from_secs(5),
                intermission: Duration::from_secs(3),
            },
            ..AppConfig::default()
        };
        let store = MemoryRoomStore::new();
        let state = AppState::new(config, Arc::new(store.clone()), "memory");
        (state, store)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::test_support::memory_state;

    #[tokio::test]
    async fn quiz_claims_are_exclusive_per_room() {
        let (state, _) = memory_state();
        assert!(state.claim_quiz("ABC123"));
        assert!(!state.claim_quiz("ABC123"));
        assert!(state.claim_quiz("XYZ789"));
        state.release_quiz("ABC123");
        assert!(!state.is_quiz_running("ABC123"));
        assert!(state.claim_quiz("ABC123"));
    }

    #[tokio::test]
    async fn room_lock_serializes_holders() {
        let (state, _) = memory_state();
        let guard = state.lock_room("ABC123").await;

        let contender = {
            let state = state.clone();
            tokio::spawn(async move {
                let _guard = state.lock_room("ABC123").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        // Other rooms are unaffected.
        drop(state.lock_room("XYZ789").await);

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn lock_entries_are_removed_once_released() {
        let (state, _) = memory_state();
        let guard = state.lock_room("ABC123").await;
        assert_eq!(state.room_lock_count(), 1);

        let contender = {
            let state = state.clone();
            tokio::spawn(async move {
                let _guard = state.lock_room("ABC123").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        // The waiting contender keeps the entry alive after the first holder leaves.
        drop(guard);
        contender.await.unwrap();

        assert_eq!(state.room_lock_count(), 0);
    }
}
