//! Atomic "advance and check terminal" step shared by the orchestrator and the
//! next-question route.

use tracing::{info, warn};

use crate::{
    dao::{
        models::{Question, Room},
        room::RoomRepository,
        storage::StorageResult,
    },
    dto::ws::{BroadcastEnvelope, Scoreboard},
    error::ServiceError,
    state::SharedState,
};

/// Outcome of one progression step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// `question` at `index` was persisted as announced and broadcast.
    Question {
        /// The announced question.
        question: Question,
        /// Zero-based position of `question` in the room's list.
        index: usize,
        /// Length of the room's question list.
        total: usize,
    },
    /// Every question was played: game-over was broadcast and the room records deleted.
    Finished {
        /// Final scores, compiled before the records were deleted.
        scoreboard: Scoreboard,
    },
    /// Nothing to play: the room or its questions are gone, or the stored list is empty.
    AlreadyEnded,
}

/// Announce the room's next question, or finalize the room when none remain.
///
/// Runs under the room lock, so concurrent callers each observe a distinct index and
/// exactly one of them finalizes.
pub async fn advance(state: &SharedState, code: &str) -> Result<Advance, ServiceError> {
    let _guard = state.lock_room(code).await;
    let repository = state.repository();

    let Some(mut room) = repository.find_room(code).await? else {
        return Ok(Advance::AlreadyEnded);
    };
    let Some(questions) = repository.find_questions(code).await? else {
        return Ok(Advance::AlreadyEnded);
    };

    let total = questions.len();
    let index = room.current_question_index;
    if total == 0 {
        warn!(room = %code, "room has an empty question list; nothing to announce");
        return Ok(Advance::AlreadyEnded);
    }
    if index >= total {
        if index > total {
            warn!(room = %code, index, total, "question index past the end; finalizing");
        }
        let scoreboard = finalize(state, &repository, &room).await?;
        return Ok(Advance::Finished { scoreboard });
    }

    let question = questions[index].clone();
    room.current_question_index = index + 1;
    repository.save_room(&room).await?;

    state
        .hub()
        .broadcast_envelope(code, &BroadcastEnvelope::Question(question.clone()));
    info!(room = %code, question = %question.id, index, total, "question announced");

    Ok(Advance::Question {
        question,
        index,
        total,
    })
}

/// Read every player's score in join order.
pub async fn compile_scoreboard(repository: &RoomRepository, room: &Room) -> StorageResult<Scoreboard> {
    let mut scoreboard = Scoreboard::with_capacity(room.players.len());
    for player in &room.players {
        let score = repository.score(&room.code, player).await?;
        scoreboard.insert(player.clone(), score);
    }
    Ok(scoreboard)
}

async fn finalize(
    state: &SharedState,
    repository: &RoomRepository,
    room: &Room,
) -> Result<Scoreboard, ServiceError> {
    let scoreboard = compile_scoreboard(repository, room).await?;
    state
        .hub()
        .broadcast_envelope(&room.code, &BroadcastEnvelope::GameOver(scoreboard.clone()));

    repository.delete_room_records(&room.code, &room.players).await?;
    info!(room = %room.code, players = room.players.len(), "game over; room records deleted");

    Ok(scoreboard)
}
