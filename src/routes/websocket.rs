use axum::{
    Router,
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};

use crate::{services::websocket_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/ws/{code}/{player_id}",
    tag = "websocket",
    params(
        ("code" = String, Path, description = "Room code"),
        ("player_id" = String, Path, description = "Player identifier")
    ),
    responses((status = 101, description = "Switching protocols to WebSocket"))
)]
/// Upgrade the HTTP connection into a room subscription.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Path((code, player_id)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_service::handle_socket(state, socket, code, player_id))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws/{code}/{player_id}", get(ws_handler))
}
