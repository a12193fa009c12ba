use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    dao::models::Question,
    dto::game::{
        AnswerRequest, AnswerResponse, NextQuestionResponse, ScoreboardResponse, StartGameRequest,
        StartGameResponse,
    },
    error::AppError,
    services::game_service,
    state::SharedState,
};

/// Routes driving a game once players have joined.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/start-game", post(start_game))
        .route("/submit-answer", post(submit_answer))
        .route("/room/{code}/questions", get(questions))
        .route("/room/{code}/scoreboard", get(scoreboard))
        .route("/room/{code}/next-question", get(next_question))
}

/// Generate the questions of a room and start its quiz.
#[utoipa::path(
    post,
    path = "/start-game",
    tag = "game",
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Quiz started", body = StartGameResponse),
        (status = 403, description = "Caller is not the host"),
        (status = 404, description = "Room not found"),
        (status = 409, description = "Room not waiting, or not enough tracks")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Json(payload): Json<StartGameRequest>,
) -> Result<Json<StartGameResponse>, AppError> {
    let response = game_service::start_game(&state, payload).await?;
    Ok(Json(response))
}

/// Score a player's answer to one question.
#[utoipa::path(
    post,
    path = "/submit-answer",
    tag = "game",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer scored", body = AnswerResponse),
        (status = 404, description = "Unknown question or room")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    let response = game_service::submit_answer(&state, payload).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/room/{code}/questions",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Generated questions", body = [Question]),
        (status = 404, description = "No questions for this room")
    )
)]
pub async fn questions(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<Vec<Question>>, AppError> {
    let questions = game_service::questions(&state, &code).await?;
    Ok(Json(questions))
}

#[utoipa::path(
    get,
    path = "/room/{code}/scoreboard",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Scores in join order", body = ScoreboardResponse),
        (status = 404, description = "Room not found")
    )
)]
pub async fn scoreboard(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<ScoreboardResponse>, AppError> {
    let response = game_service::scoreboard(&state, &code).await?;
    Ok(Json(response))
}

/// Advance the room by one question, broadcasting it to connected players.
#[utoipa::path(
    get,
    path = "/room/{code}/next-question",
    tag = "game",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Next question", body = NextQuestionResponse),
        (status = 204, description = "No more questions; the game is over")
    )
)]
pub async fn next_question(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    let response = match game_service::next_question(&state, &code).await? {
        Some(next) => Json(next).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}
