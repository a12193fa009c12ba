//! Pure state machine of a room's quiz orchestrator.

use thiserror::Error;

/// Phases a room's orchestrator moves through once a game is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    /// Waiting out the warm-up delay so clients can finish subscribing.
    Scheduled,
    /// Loading records and broadcasting the next question.
    Announcing,
    /// The question at `index` is live; answers arrive out-of-band.
    AwaitingAnswers {
        /// Position of the live question in the room's list.
        index: usize,
    },
    /// Interim scoreboard for `index` was broadcast; pausing before the next question.
    Intermission {
        /// Position of the question that just closed.
        index: usize,
    },
    /// All questions were played; game-over broadcast and record cleanup.
    Finalizing,
    /// Nothing left to do; the orchestrator task exits.
    Terminated,
}

/// Why an orchestrator stopped before reaching the natural end of the quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The room or question record is gone: another path finished the game or the TTL expired.
    RecordsMissing,
    /// The store could not be reached or returned unreadable data.
    StoreFailure,
}

/// Events that move the orchestrator between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizEvent {
    /// The warm-up delay after start-game ran out.
    WarmupElapsed,
    /// The question at `index` was persisted and broadcast.
    QuestionAnnounced {
        /// Position of the announced question.
        index: usize,
    },
    /// The answer window of the live question closed.
    AnswerWindowClosed,
    /// The pause after an interim scoreboard ran out.
    IntermissionElapsed,
    /// Every question was played and the room was finalized.
    QuestionsExhausted,
    /// Finalization work is complete.
    CleanupDone,
    /// Stop at once, from any live phase.
    Abort(AbortReason),
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid quiz transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the machine was in.
    pub from: QuizPhase,
    /// Event that does not apply to `from`.
    pub event: QuizEvent,
}

/// Per-orchestrator progression state. Pure; timers and storage live in the orchestrator.
#[derive(Debug, Clone)]
pub struct QuizMachine {
    phase: QuizPhase,
    announced: usize,
}

impl Default for QuizMachine {
    fn default() -> Self {
        Self {
            phase: QuizPhase::Scheduled,
            announced: 0,
        }
    }
}

impl QuizMachine {
    /// Machine in [`QuizPhase::Scheduled`] with nothing announced.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    /// Number of questions this orchestrator announced itself.
    pub fn announced(&self) -> usize {
        self.announced
    }

    /// Whether the machine reached [`QuizPhase::Terminated`].
    pub fn is_terminated(&self) -> bool {
        self.phase == QuizPhase::Terminated
    }

    /// Apply `event`, returning the new phase or leaving the machine untouched on error.
    pub fn apply(&mut self, event: QuizEvent) -> Result<QuizPhase, InvalidTransition> {
        let next = self.compute_transition(event)?;
        if let QuizEvent::QuestionAnnounced { .. } = event {
            self.announced += 1;
        }
        self.phase = next;
        Ok(next)
    }

    fn compute_transition(&self, event: QuizEvent) -> Result<QuizPhase, InvalidTransition> {
        let next = match (self.phase, event) {
            (QuizPhase::Scheduled, QuizEvent::WarmupElapsed) => QuizPhase::Announcing,
            (QuizPhase::Announcing, QuizEvent::QuestionAnnounced { index }) => {
                QuizPhase::AwaitingAnswers { index }
            }
            (QuizPhase::AwaitingAnswers { index }, QuizEvent::AnswerWindowClosed) => {
                QuizPhase::Intermission { index }
            }
            (QuizPhase::Intermission { .. }, QuizEvent::IntermissionElapsed) => {
                QuizPhase::Announcing
            }
            (QuizPhase::Announcing, QuizEvent::QuestionsExhausted) => QuizPhase::Finalizing,
            (QuizPhase::Finalizing, QuizEvent::CleanupDone) => QuizPhase::Terminated,
            (phase, QuizEvent::Abort(_)) if phase != QuizPhase::Terminated => {
                QuizPhase::Terminated
            }
            (from, event) => return Err(InvalidTransition { from, event }),
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(machine: &mut QuizMachine, event: QuizEvent) -> QuizPhase {
        machine.apply(event).unwrap()
    }

    #[test]
    fn initial_phase_is_scheduled() {
        assert_eq!(QuizMachine::new().phase(), QuizPhase::Scheduled);
    }

    #[test]
    fn full_two_question_game() {
        let mut machine = QuizMachine::new();
        assert_eq!(apply(&mut machine, QuizEvent::WarmupElapsed), QuizPhase::Announcing);

        for index in 0..2 {
            assert_eq!(
                apply(&mut machine, QuizEvent::QuestionAnnounced { index }),
                QuizPhase::AwaitingAnswers { index }
            );
            assert_eq!(
                apply(&mut machine, QuizEvent::AnswerWindowClosed),
                QuizPhase::Intermission { index }
            );
            assert_eq!(
                apply(&mut machine, QuizEvent::IntermissionElapsed),
                QuizPhase::Announcing
            );
        }

        assert_eq!(
            apply(&mut machine, QuizEvent::QuestionsExhausted),
            QuizPhase::Finalizing
        );
        assert_eq!(apply(&mut machine, QuizEvent::CleanupDone), QuizPhase::Terminated);
        assert_eq!(machine.announced(), 2);
        assert!(machine.is_terminated());
    }

    #[test]
    fn abort_is_accepted_from_any_live_phase() {
        let mut machine = QuizMachine::new();
        apply(&mut machine, QuizEvent::WarmupElapsed);
        apply(&mut machine, QuizEvent::QuestionAnnounced { index: 0 });
        assert_eq!(
            apply(&mut machine, QuizEvent::Abort(AbortReason::RecordsMissing)),
            QuizPhase::Terminated
        );
    }

    #[test]
    fn terminated_is_final() {
        let mut machine = QuizMachine::new();
        apply(&mut machine, QuizEvent::Abort(AbortReason::StoreFailure));

        let err = machine
            .apply(QuizEvent::Abort(AbortReason::StoreFailure))
            .unwrap_err();
        assert_eq!(err.from, QuizPhase::Terminated);
        assert!(machine.apply(QuizEvent::WarmupElapsed).is_err());
    }

    #[test]
    fn cannot_announce_before_warmup() {
        let mut machine = QuizMachine::new();
        let err = machine
            .apply(QuizEvent::QuestionAnnounced { index: 0 })
            .unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                from: QuizPhase::Scheduled,
                event: QuizEvent::QuestionAnnounced { index: 0 },
            }
        );
        assert_eq!(machine.phase(), QuizPhase::Scheduled);
    }

    #[test]
    fn cannot_finish_while_a_question_is_live() {
        let mut machine = QuizMachine::new();
        apply(&mut machine, QuizEvent::WarmupElapsed);
        apply(&mut machine, QuizEvent::QuestionAnnounced { index: 0 });
        assert!(machine.apply(QuizEvent::QuestionsExhausted).is_err());
    }
}
