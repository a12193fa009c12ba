use axum::Router;

use crate::state::SharedState;

/// Swagger UI and the OpenAPI document.
pub mod docs;
/// Game endpoints.
pub mod game;
/// Healthcheck endpoint.
pub mod health;
/// Room endpoints.
pub mod room;
/// WebSocket upgrade endpoint.
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(room::router())
        .merge(game::router())
        .merge(websocket::router());

    api_router.merge(docs::router()).with_state(state)
}
