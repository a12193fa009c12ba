use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// Lifecycle flag stored on a room record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// Players may still join; no questions have been generated.
    Waiting,
    /// A quiz was started and is progressing.
    Active,
}

/// A play session persisted under `room:{code}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Short code identifying the room.
    pub code: String,
    /// Player that created the room and is allowed to start it.
    pub host_id: String,
    /// Creation instant, RFC 3339 on the wire.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    /// Joined players, in join order, without duplicates.
    #[serde(default)]
    pub players: Vec<String>,
    /// Whether the room still accepts new players.
    pub game_state: GameState,
    /// Index of the next question to announce; equals the question count once exhausted.
    #[serde(default)]
    pub current_question_index: usize,
}

impl Room {
    /// Build a fresh room waiting for players.
    pub fn new(code: String, host_id: String) -> Self {
        Self {
            code,
            host_id,
            created_at: OffsetDateTime::now_utc(),
            players: Vec::new(),
            game_state: GameState::Waiting,
            current_question_index: 0,
        }
    }

    /// Append `player_id` unless it already joined. Returns whether the roster changed.
    pub fn add_player(&mut self, player_id: &str) -> bool {
        if self.players.iter().any(|existing| existing == player_id) {
            return false;
        }
        self.players.push(player_id.to_string());
        true
    }
}

/// A single multiple-choice question. Immutable once generated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// `q1`, `q2`, ... in play order.
    pub id: String,
    /// Track the question is about.
    pub track_id: String,
    /// Title of that track.
    pub track_name: String,
    /// Four distinct titles in the order shown to clients.
    pub answer_options: Vec<String>,
    /// The option equal to `track_name`.
    pub correct_answer: String,
    /// Where playback of the track preview should start.
    pub playback_start_offset_ms: u64,
}

/// Track cached for a player under `tracks:{code}:{playerId}` when joining.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Catalogue id; tracks without one are never asked.
    pub id: String,
    /// Title.
    pub name: String,
    /// Performing artists.
    #[serde(default)]
    pub artists: Vec<String>,
    /// Track length, bounds the playback offset.
    #[serde(default)]
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_player_keeps_roster_unique_and_ordered() {
        let mut room = Room::new("ABC123".into(), "host".into());
        assert!(room.add_player("alice"));
        assert!(room.add_player("bob"));
        assert!(!room.add_player("alice"));
        assert_eq!(room.players, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn room_uses_camel_case_wire_names() {
        let room = Room::new("ABC123".into(), "host".into());
        let value = serde_json::to_value(&room).unwrap();
        assert_eq!(value["hostId"], "host");
        assert_eq!(value["gameState"], "waiting");
        assert_eq!(value["currentQuestionIndex"], 0);
        assert!(value["createdAt"].is_string());

        let decoded: Room = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.code, "ABC123");
    }
}
