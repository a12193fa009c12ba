//! OpenAPI document aggregating every route and schema.

use utoipa::OpenApi;

/// OpenAPI document of the whole service.
#[derive(OpenApi)]
/// Aggregated OpenAPI document for the quiz backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::room::create_room,
        crate::routes::room::join_room,
        crate::routes::room::get_room,
        crate::routes::game::start_game,
        crate::routes::game::submit_answer,
        crate::routes::game::questions,
        crate::routes::game::scoreboard,
        crate::routes::game::next_question,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::room::CreateRoomRequest,
            crate::dto::room::CreateRoomResponse,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::JoinRoomResponse,
            crate::dto::game::StartGameRequest,
            crate::dto::game::StartGameResponse,
            crate::dto::game::AnswerRequest,
            crate::dto::game::AnswerResponse,
            crate::dto::game::ScoreboardResponse,
            crate::dto::game::NextQuestionResponse,
            crate::dao::models::Room,
            crate::dao::models::Question,
            crate::dao::models::Track,
            crate::dao::models::GameState,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "room", description = "Room creation and membership"),
        (name = "game", description = "Quiz start, answers and progression"),
        (name = "websocket", description = "Real-time room broadcasts"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/healthcheck",
            "/create-room",
            "/join-room",
            "/room/{code}",
            "/start-game",
            "/submit-answer",
            "/room/{code}/questions",
            "/room/{code}/scoreboard",
            "/room/{code}/next-question",
            "/ws/{code}/{player_id}",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
