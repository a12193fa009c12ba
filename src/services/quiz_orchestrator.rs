//! Timer-driven progression of one started room: warm-up, then question, answer
//! window and interim scoreboard until the list is exhausted.

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{
    dto::ws::BroadcastEnvelope,
    error::ServiceError,
    services::progression::{self, Advance, compile_scoreboard},
    state::{
        SharedState,
        quiz_machine::{AbortReason, QuizEvent, QuizMachine, QuizPhase},
    },
};

/// Spawn the orchestrator of `code` unless one is already running for it.
///
/// Returns whether a new task was started.
pub fn start(state: &SharedState, code: &str) -> bool {
    if !state.claim_quiz(code) {
        warn!(room = %code, "orchestrator already running; not starting another");
        return false;
    }

    let state = state.clone();
    let code = code.to_string();
    tokio::spawn(async move {
        run(&state, &code).await;
        state.release_quiz(&code);
    });
    true
}

/// Drive one room from warm-up to termination.
pub(crate) async fn run(state: &SharedState, code: &str) {
    let timings = state.config().quiz.clone();
    let mut machine = QuizMachine::new();
    info!(room = %code, "quiz scheduled");

    sleep(timings.warmup).await;
    let mut event = QuizEvent::WarmupElapsed;

    loop {
        if let Err(err) = machine.apply(event) {
            error!(room = %code, error = %err, "orchestrator stopped on invalid transition");
            return;
        }
        debug!(room = %code, phase = ?machine.phase(), "quiz phase changed");
        if machine.is_terminated() {
            info!(room = %code, announced = machine.announced(), "quiz orchestrator finished");
            return;
        }

        event = match machine.phase() {
            QuizPhase::Announcing => announce(state, code).await,
            QuizPhase::AwaitingAnswers { .. } => {
                sleep(timings.answer_window).await;
                QuizEvent::AnswerWindowClosed
            }
            QuizPhase::Intermission { index } => match broadcast_scoreboard(state, code).await {
                Ok(true) => {
                    debug!(room = %code, index, "interim scoreboard broadcast");
                    sleep(timings.intermission).await;
                    QuizEvent::IntermissionElapsed
                }
                Ok(false) => QuizEvent::Abort(AbortReason::RecordsMissing),
                Err(err) => {
                    warn!(room = %code, error = %err, "failed to compile scoreboard");
                    QuizEvent::Abort(AbortReason::StoreFailure)
                }
            },
            // The progression step already broadcast game-over and deleted the records.
            QuizPhase::Finalizing => QuizEvent::CleanupDone,
            phase @ (QuizPhase::Scheduled | QuizPhase::Terminated) => {
                error!(room = %code, ?phase, "orchestrator has no work for this phase");
                return;
            }
        };

        if let QuizEvent::Abort(reason) = event {
            match reason {
                AbortReason::RecordsMissing => {
                    info!(room = %code, "room records gone; game already concluded")
                }
                AbortReason::StoreFailure => warn!(room = %code, "aborting quiz on store failure"),
            }
        }
    }
}

async fn announce(state: &SharedState, code: &str) -> QuizEvent {
    match progression::advance(state, code).await {
        Ok(Advance::Question { index, .. }) => QuizEvent::QuestionAnnounced { index },
        Ok(Advance::Finished { .. }) => QuizEvent::QuestionsExhausted,
        Ok(Advance::AlreadyEnded) => QuizEvent::Abort(AbortReason::RecordsMissing),
        Err(err) => {
            warn!(room = %code, error = %err, "failed to advance quiz");
            QuizEvent::Abort(AbortReason::StoreFailure)
        }
    }
}

/// Broadcast the interim scoreboard. Returns `false` when the room is gone.
async fn broadcast_scoreboard(state: &SharedState, code: &str) -> Result<bool, ServiceError> {
    let repository = state.repository();
    let Some(room) = repository.find_room(code).await? else {
        return Ok(false);
    };
    let scoreboard = compile_scoreboard(&repository, &room).await?;
    state
        .hub()
        .broadcast_envelope(code, &BroadcastEnvelope::Scoreboard(scoreboard));
    Ok(true)
}
