use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dao::models::Track, dto::validation::validate_room_code};

/// Payload used to open a new room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    /// Player that will own the room.
    #[validate(length(min = 1, max = 128))]
    pub host_id: String,
}

/// Code of a newly created room.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    /// Six-character room code.
    pub room_code: String,
}

/// Payload used by a player to enter a waiting room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    /// Room to join.
    #[validate(custom(function = "validate_room_code"))]
    pub room_code: String,
    /// Joining player.
    #[validate(length(min = 1, max = 128))]
    pub player_id: String,
    /// Track pool contributed by the player; questions are generated from these at start.
    #[serde(default)]
    pub tracks: Option<Vec<Track>>,
}

/// Acknowledgement of a join.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomResponse {
    /// Always `joined`.
    pub status: String,
    /// Joined room.
    pub room_code: String,
    /// Joined player.
    pub player_id: String,
}
