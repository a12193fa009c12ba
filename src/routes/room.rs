use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dao::models::Room,
    dto::room::{CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, JoinRoomResponse},
    error::AppError,
    services::room_service,
    state::SharedState,
};

/// Routes handling room creation and membership.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/create-room", post(create_room))
        .route("/join-room", post(join_room))
        .route("/room/{code}", get(get_room))
}

/// Open a new waiting room.
#[utoipa::path(
    post,
    path = "/create-room",
    tag = "room",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = CreateRoomResponse),
        (status = 400, description = "Invalid host id"),
        (status = 503, description = "Room store unavailable")
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, AppError> {
    let response = room_service::create_room(&state, payload).await?;
    Ok(Json(response))
}

/// Join a room, optionally contributing tracks for question generation.
#[utoipa::path(
    post,
    path = "/join-room",
    tag = "room",
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Player joined", body = JoinRoomResponse),
        (status = 400, description = "Invalid room code or player id"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Game already started")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    let response = room_service::join_room(&state, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/room/{code}",
    tag = "room",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Room record", body = Room),
        (status = 404, description = "Room not found")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Room>, AppError> {
    let room = room_service::get_room(&state, &code).await?;
    Ok(Json(room))
}
