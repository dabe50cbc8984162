//! Typed wrappers around [`SseHub::broadcast`] for every game event.

use std::time::SystemTime;

use tracing::debug;

use crate::{
    dao::models::{AnswerLetter, QuestionEntity},
    dto::{
        format_system_time,
        sse::{
            AnswerRevealedEvent, AnswerSelectedEvent, EVENT_ANSWER_REVEALED, EVENT_ANSWER_SELECTED,
            EVENT_GAME_ENDED, EVENT_LIFELINE_USED, EVENT_QUESTION_CHANGED, GameEndReason,
            GameEndedEvent, LifelineUsedEvent, QuestionChangedEvent,
        },
    },
    state::{
        BroadcastTarget, SseHub,
        state_machine::{GameSession, Lifeline},
    },
};

/// Announce that the current question moved. `question_time_limit` reseeds client countdowns.
pub fn broadcast_question_changed(hub: &SseHub, session: &GameSession, question_time_limit: u32) {
    let payload = QuestionChangedEvent {
        question_index: session.current_question_index,
        total_questions: session.total_questions,
        status: Some(session.status),
        question_time_limit: Some(question_time_limit),
    };
    send_to_all(hub, EVENT_QUESTION_CHANGED, &payload);
}

/// Announce the answer the host highlighted.
pub fn broadcast_answer_selected(
    hub: &SseHub,
    session: &GameSession,
    question: &QuestionEntity,
    answer: AnswerLetter,
) {
    let payload = AnswerSelectedEvent {
        selected_answer: answer,
        question_index: session.current_question_index,
        question_id: question.id,
    };
    send_to_all(hub, EVENT_ANSWER_SELECTED, &payload);
}

/// Announce the settled answer. `question_index` is the index the answer was given on.
pub fn broadcast_answer_revealed(
    hub: &SseHub,
    question: &QuestionEntity,
    question_index: usize,
    answer: AnswerLetter,
    game_won: bool,
) {
    let payload = AnswerRevealedEvent {
        selected_answer: answer,
        correct_answer: question.correct_answer,
        is_correct: answer == question.correct_answer,
        question_index,
        question_id: question.id,
        game_won,
    };
    send_to_all(hub, EVENT_ANSWER_REVEALED, &payload);
}

/// Announce a consumed lifeline with the answers it hid, if any.
pub fn broadcast_lifeline_used(hub: &SseHub, session: &GameSession, lifeline: Lifeline) {
    let payload = LifelineUsedEvent {
        lifeline,
        lifeline_name: lifeline.display_name().to_string(),
        question_index: session.current_question_index,
        used_lifelines: session.used_lifelines,
    };
    send_to_all(hub, EVENT_LIFELINE_USED, &payload);
}

/// Announce a host-initiated end of the game.
pub fn broadcast_game_ended(hub: &SseHub) {
    let payload = GameEndedEvent {
        reason: GameEndReason::Manual,
        timestamp: format_system_time(SystemTime::now()),
    };
    send_to_all(hub, EVENT_GAME_ENDED, &payload);
}

fn send_to_all<T: serde::Serialize>(hub: &SseHub, event: &str, payload: &T) {
    let delivered = hub.broadcast(event, payload, BroadcastTarget::All);
    debug!(event, delivered, "broadcast game event");
}
