use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::Question,
    dto::{validation::validate_room_code, ws::Scoreboard},
};

/// Request sent by the host to start the quiz of a room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    /// Room to start.
    #[validate(custom(function = "validate_room_code"))]
    pub room_code: String,
    /// Must match the room's host.
    #[validate(length(min = 1, max = 128))]
    pub host_id: String,
}

/// Acknowledgement of a started quiz.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartGameResponse {
    /// Always `started`.
    pub status: String,
    /// Number of questions generated.
    pub questions_count: usize,
}

/// A player's answer to one question.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    /// Room the question belongs to.
    #[validate(custom(function = "validate_room_code"))]
    pub room_code: String,
    /// Question being answered.
    #[validate(length(min = 1))]
    pub question_id: String,
    /// Picked option, compared case-sensitively with the correct answer.
    pub selected: String,
    /// Answering player.
    #[validate(length(min = 1, max = 128))]
    pub player_id: String,
}

/// Outcome of an answer submission, with the player's score afterwards.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct AnswerResponse {
    /// Whether `selected` matched the correct answer.
    pub correct: bool,
    /// Player's total score after this submission.
    pub score: u64,
}

/// Every player's score in join order.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreboardResponse {
    /// Player id to score.
    #[schema(value_type = Object)]
    pub scoreboard: Scoreboard,
}

/// Question handed out by the next-question endpoint.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct NextQuestionResponse {
    /// The announced question.
    pub question: Question,
    /// Zero-based position of the question.
    pub index: usize,
    /// Number of questions in the room.
    pub total: usize,
}
