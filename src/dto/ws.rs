use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::dao::models::Question;

/// Player scores keyed by player id, in room join order.
pub type Scoreboard = IndexMap<String, u64>;

/// Wire unit fanned out to every socket of a room.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum BroadcastEnvelope {
    /// A question was announced.
    Question(Question),
    /// Interim scores after a question's answer window.
    Scoreboard(Scoreboard),
    /// The host started the game; questions follow after the warm-up.
    GameStarted,
    /// Final scores; the room's records are deleted right after.
    GameOver(Scoreboard),
}

impl BroadcastEnvelope {
    /// Wire name of the envelope, as written in its `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Question(_) => "question",
            Self::Scoreboard(_) => "scoreboard",
            Self::GameStarted => "game-started",
            Self::GameOver(_) => "game-over",
        }
    }

    /// Encode as the `{type, data}` text frame sent to sockets.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Raw `{type, data}` frame received from a client socket.
#[derive(Debug, Deserialize)]
pub struct SocketEnvelope {
    /// Message type tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific payload, `null` when omitted.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Payload of an `answer` frame. Answers are only scored over HTTP.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketAnswer {
    /// Question being answered.
    pub question_id: String,
    /// Option the player picked.
    pub selected: String,
}

/// Control messages understood on the inbound side of a client socket.
#[derive(Debug)]
pub enum ClientInboundMessage {
    /// An answer sent over the socket instead of HTTP.
    Answer(SocketAnswer),
    /// Any other type tag, kept for logging.
    Unknown(String),
}

impl ClientInboundMessage {
    /// Decode an inbound text frame. Only malformed JSON or a malformed `answer` payload fail.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        let envelope: SocketEnvelope = serde_json::from_str(text)?;
        match envelope.kind.as_str() {
            "answer" => serde_json::from_value(envelope.data).map(Self::Answer),
            _ => Ok(Self::Unknown(envelope.kind)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn game_started_has_no_data_field() {
        let value: serde_json::Value =
            serde_json::from_str(&BroadcastEnvelope::GameStarted.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({ "type": "game-started" }));
    }

    #[test]
    fn scoreboard_keeps_player_order() {
        let mut board = Scoreboard::new();
        board.insert("zoe".into(), 0);
        board.insert("adam".into(), 1000);
        let text = BroadcastEnvelope::Scoreboard(board).to_json().unwrap();
        assert_eq!(text, r#"{"type":"scoreboard","data":{"zoe":0,"adam":1000}}"#);
    }

    #[test]
    fn question_envelope_carries_the_question() {
        let question = Question {
            id: "q1".into(),
            track_id: "t1".into(),
            track_name: "Song".into(),
            answer_options: vec!["Song".into(), "A".into(), "B".into(), "C".into()],
            correct_answer: "Song".into(),
            playback_start_offset_ms: 1200,
        };
        let value = serde_json::to_value(BroadcastEnvelope::Question(question)).unwrap();
        assert_eq!(value["type"], "question");
        assert_eq!(value["data"]["trackId"], "t1");
        assert_eq!(value["data"]["playbackStartOffsetMs"], 1200);
    }

    #[test]
    fn inbound_unknown_types_are_preserved_for_logging() {
        let message = ClientInboundMessage::from_json_str(r#"{"type":"emote","data":{}}"#).unwrap();
        assert!(matches!(message, ClientInboundMessage::Unknown(kind) if kind == "emote"));
    }

    #[test]
    fn inbound_answer_is_decoded() {
        let message = ClientInboundMessage::from_json_str(
            r#"{"type":"answer","data":{"questionId":"q2","selected":"Song"}}"#,
        )
        .unwrap();
        match message {
            ClientInboundMessage::Answer(answer) => {
                assert_eq!(answer.question_id, "q2");
                assert_eq!(answer.selected, "Song");
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn inbound_garbage_is_an_error() {
        assert!(ClientInboundMessage::from_json_str("not json").is_err());
    }
}
