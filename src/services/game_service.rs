//! Game operations: start-game, answer scoring, question listing, scoreboard and the
//! on-demand next-question trigger.

use tracing::{info, warn};
use validator::Validate;

use crate::{
    dao::models::{GameState, Question},
    dto::{
        game::{
            AnswerRequest, AnswerResponse, NextQuestionResponse, ScoreboardResponse,
            StartGameRequest, StartGameResponse,
        },
        ws::BroadcastEnvelope,
    },
    error::ServiceError,
    services::{
        progression::{self, Advance, compile_scoreboard},
        question_generator::generate_questions,
        quiz_orchestrator,
        room_service::ensure_room_code,
    },
    state::SharedState,
};

/// Generate the questions of a waiting room, mark it active and start its orchestrator.
pub async fn start_game(
    state: &SharedState,
    request: StartGameRequest,
) -> Result<StartGameResponse, ServiceError> {
    request.validate()?;
    let code = request.room_code;

    let questions_count = {
        let _guard = state.lock_room(&code).await;
        let repository = state.repository();
        let Some(mut room) = repository.find_room(&code).await? else {
            return Err(ServiceError::NotFound(format!("room `{code}` not found")));
        };
        if room.host_id != request.host_id {
            return Err(ServiceError::Forbidden(
                "only the host can start the game".into(),
            ));
        }
        if room.game_state != GameState::Waiting {
            return Err(ServiceError::InvalidState(format!(
                "room `{code}` is not waiting for players"
            )));
        }

        let mut pool = Vec::new();
        for player in &room.players {
            match repository.find_tracks(&code, player).await? {
                Some(tracks) => pool.extend(tracks),
                None => warn!(room = %code, player = %player, "player has no cached tracks"),
            }
        }

        let questions = generate_questions(pool, state.config().max_questions, &mut rand::rng());
        if questions.is_empty() {
            return Err(ServiceError::InvalidState(
                "not enough tracks to generate questions".into(),
            ));
        }

        repository.save_questions(&code, &questions).await?;
        room.game_state = GameState::Active;
        room.current_question_index = 0;
        repository.save_room(&room).await?;
        questions.len()
    };

    info!(room = %code, questions = questions_count, "game started");
    state
        .hub()
        .broadcast_envelope(&code, &BroadcastEnvelope::GameStarted);
    quiz_orchestrator::start(state, &code);

    Ok(StartGameResponse {
        status: "started".into(),
        questions_count,
    })
}

/// Score a player's answer. Resubmitting a correct answer awards the points again.
pub async fn submit_answer(
    state: &SharedState,
    request: AnswerRequest,
) -> Result<AnswerResponse, ServiceError> {
    request.validate()?;

    let repository = state.repository();
    let code = &request.room_code;
    let Some(questions) = repository.find_questions(code).await? else {
        return Err(ServiceError::NotFound(format!(
            "no questions for room `{code}`"
        )));
    };
    let Some(question) = questions.iter().find(|q| q.id == request.question_id) else {
        return Err(ServiceError::NotFound(format!(
            "question `{}` not found",
            request.question_id
        )));
    };

    let correct = request.selected == question.correct_answer;
    let mut score = repository.score(code, &request.player_id).await?;
    if correct {
        score += state.config().points_per_answer;
        repository.save_score(code, &request.player_id, score).await?;
    }

    info!(
        room = %code,
        player = %request.player_id,
        question = %question.id,
        correct,
        score,
        "answer submitted"
    );

    Ok(AnswerResponse { correct, score })
}

/// Stored question list of a started room.
pub async fn questions(state: &SharedState, code: &str) -> Result<Vec<Question>, ServiceError> {
    ensure_room_code(code)?;
    state
        .repository()
        .find_questions(code)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no questions for room `{code}`")))
}

/// Current score of every player, in join order.
pub async fn scoreboard(state: &SharedState, code: &str) -> Result<ScoreboardResponse, ServiceError> {
    ensure_room_code(code)?;
    let repository = state.repository();
    let Some(room) = repository.find_room(code).await? else {
        return Err(ServiceError::NotFound(format!("room `{code}` not found")));
    };
    let scoreboard = compile_scoreboard(&repository, &room).await?;
    Ok(ScoreboardResponse { scoreboard })
}

/// Advance the room on demand. `None` means there is no further question to hand out.
pub async fn next_question(
    state: &SharedState,
    code: &str,
) -> Result<Option<NextQuestionResponse>, ServiceError> {
    ensure_room_code(code)?;
    match progression::advance(state, code).await? {
        Advance::Question {
            question,
            index,
            total,
        } => Ok(Some(NextQuestionResponse {
            question,
            index,
            total,
        })),
        Advance::Finished { .. } | Advance::AlreadyEnded => Ok(None),
    }
}
