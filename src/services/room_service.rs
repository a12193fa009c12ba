//! Room lifecycle before a game: creation, joining and lookup.

use rand::Rng;
use tracing::info;
use validator::Validate;

use crate::{
    dao::models::{GameState, Room},
    dto::{
        room::{CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse},
        validation::{ROOM_CODE_LENGTH, validate_room_code},
    },
    error::ServiceError,
    state::SharedState,
};

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Attempts at drawing a code that is not already in use.
const MAX_CODE_ATTEMPTS: usize = 8;

/// Open a waiting room owned by `host_id` under a fresh random code.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<CreateRoomResponse, ServiceError> {
    request.validate()?;

    let repository = state.repository();
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = generate_room_code(&mut rand::rng());
        let _guard = state.lock_room(&code).await;
        if repository.find_room(&code).await?.is_some() {
            continue;
        }

        let room = Room::new(code.clone(), request.host_id.clone());
        repository.save_room(&room).await?;
        info!(room = %code, host = %room.host_id, "room created");
        return Ok(CreateRoomResponse { room_code: code });
    }

    Err(ServiceError::Internal(
        "could not allocate an unused room code".into(),
    ))
}

/// Add a player to a waiting room and cache the tracks they contribute.
pub async fn join_room(
    state: &SharedState,
    request: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    request.validate()?;
    let JoinRoomRequest {
        room_code,
        player_id,
        tracks,
    } = request;

    let _guard = state.lock_room(&room_code).await;
    let repository = state.repository();
    let Some(mut room) = repository.find_room(&room_code).await? else {
        return Err(ServiceError::NotFound(format!("room `{room_code}` not found")));
    };

    let added = room.add_player(&player_id);
    if added && room.game_state != GameState::Waiting {
        return Err(ServiceError::InvalidState(format!(
            "room `{room_code}` already started"
        )));
    }
    // Saving an unchanged roster still refreshes the TTL.
    repository.save_room(&room).await?;

    if let Some(tracks) = tracks {
        repository.save_tracks(&room_code, &player_id, &tracks).await?;
    }

    info!(
        room = %room_code,
        player = %player_id,
        players = room.players.len(),
        rejoin = !added,
        "player joined"
    );

    Ok(JoinRoomResponse {
        status: "joined".into(),
        room_code,
        player_id,
    })
}

/// Fetch a room record.
pub async fn get_room(state: &SharedState, code: &str) -> Result<Room, ServiceError> {
    ensure_room_code(code)?;
    state
        .repository()
        .find_room(code)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{code}` not found")))
}

/// Reject path parameters that cannot be room codes.
pub fn ensure_room_code(code: &str) -> Result<(), ServiceError> {
    validate_room_code(code).map_err(|err| ServiceError::InvalidInput(err.to_string()))
}

fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LENGTH)
        .map(|_| char::from(ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())]))
        .collect()
}
