//! Reconciliation snapshots returned by the pull endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{AnswerLetter, AnswerSet},
    dto::{game::GameSessionSummary, voting::VoteSessionSummary},
};

/// The question currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    pub content: String,
    pub answers: AnswerSet,
    pub hidden_answers: Vec<AnswerLetter>,
    /// Only present on the admin snapshot, or once the answer has been revealed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<AnswerLetter>,
}

/// Settled result of the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRevealView {
    pub selected_answer: AnswerLetter,
    pub correct_answer: AnswerLetter,
    pub is_correct: bool,
    pub game_won: bool,
}

/// Authoritative state a client reconciles against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameStateResponse {
    /// Active session, or the most recent one when none is active.
    pub session: Option<GameSessionSummary>,
    pub question: Option<QuestionView>,
    pub selected_answer: Option<AnswerLetter>,
    pub reveal: Option<AnswerRevealView>,
    pub question_time_limit: u32,
    pub voting: Option<VoteSessionSummary>,
    pub degraded: bool,
}
