use std::{sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::dao::{
    models::{Question, Room, Track},
    room_store::RoomStore,
    storage::{StorageError, StorageResult},
};

/// Key of the room record.
pub fn room_key(code: &str) -> String {
    format!("room:{code}")
}

/// Key of the room's generated question list.
pub fn questions_key(code: &str) -> String {
    format!("questions:{code}")
}

/// Key of one player's score counter.
pub fn score_key(code: &str, player_id: &str) -> String {
    format!("score:{code}:{player_id}")
}

/// Key of the tracks one player contributed.
pub fn tracks_key(code: &str, player_id: &str) -> String {
    format!("tracks:{code}:{player_id}")
}

/// Data Access Object mapping room records onto the shared key layout.
///
/// Every write refreshes the record TTL.
#[derive(Clone)]
pub struct RoomRepository {
    store: Arc<dyn RoomStore>,
    ttl: Duration,
}

impl RoomRepository {
    /// Repository over `store`, writing every record with `ttl`.
    pub fn new(store: Arc<dyn RoomStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    async fn get_json<T>(&self, key: &str) -> StorageResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Malformed {
                key: key.to_string(),
                source,
            })
    }

    async fn put_json<T>(&self, key: &str, value: &T) -> StorageResult<()>
    where
        T: ?Sized + Serialize,
    {
        let raw = serde_json::to_string(value).map_err(|source| StorageError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.set(key, raw, self.ttl).await
    }

    /// Load the room record, `None` when absent or expired.
    pub async fn find_room(&self, code: &str) -> StorageResult<Option<Room>> {
        self.get_json(&room_key(code)).await
    }

    /// Persist the room record.
    pub async fn save_room(&self, room: &Room) -> StorageResult<()> {
        self.put_json(&room_key(&room.code), room).await
    }

    /// Load the room's question list.
    pub async fn find_questions(&self, code: &str) -> StorageResult<Option<Vec<Question>>> {
        self.get_json(&questions_key(code)).await
    }

    /// Persist the room's question list.
    pub async fn save_questions(&self, code: &str, questions: &[Question]) -> StorageResult<()> {
        self.put_json(&questions_key(code), questions).await
    }

    /// Read a player's score, treating an absent or unparsable counter as zero.
    pub async fn score(&self, code: &str, player_id: &str) -> StorageResult<u64> {
        let key = score_key(code, player_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(0);
        };
        match raw.trim().parse::<u64>() {
            Ok(score) => Ok(score),
            Err(err) => {
                warn!(key = %key, value = %raw, error = %err, "invalid score record; treating as 0");
                Ok(0)
            }
        }
    }

    /// Overwrite a player's score.
    pub async fn save_score(&self, code: &str, player_id: &str, score: u64) -> StorageResult<()> {
        self.store
            .set(&score_key(code, player_id), score.to_string(), self.ttl)
            .await
    }

    /// Load the tracks a player contributed when joining.
    pub async fn find_tracks(&self, code: &str, player_id: &str) -> StorageResult<Option<Vec<Track>>> {
        self.get_json(&tracks_key(code, player_id)).await
    }

    /// Cache the tracks a player contributed.
    pub async fn save_tracks(&self, code: &str, player_id: &str, tracks: &[Track]) -> StorageResult<()> {
        self.put_json(&tracks_key(code, player_id), tracks).await
    }

    /// Delete the room, its question list, and every listed player's score and track records.
    ///
    /// The room record goes first so concurrent readers observe the game as ended.
    pub async fn delete_room_records(&self, code: &str, players: &[String]) -> StorageResult<()> {
        self.store.delete(&room_key(code)).await?;
        self.store.delete(&questions_key(code)).await?;
        for player in players {
            self.store.delete(&score_key(code, player)).await?;
            self.store.delete(&tracks_key(code, player)).await?;
        }
        Ok(())
    }
}
