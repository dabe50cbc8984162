use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{AnswerLetter, SessionStatus, UsedLifelines},
    dto::format_system_time,
    state::state_machine::GameSession,
};

/// Letters hidden by fifty-fifty on one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HiddenAnswersView {
    pub question_index: usize,
    pub letters: Vec<AnswerLetter>,
}

/// Public projection of a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionSummary {
    pub id: Uuid,
    pub status: SessionStatus,
    pub current_question_index: usize,
    pub total_questions: usize,
    pub used_lifelines: UsedLifelines,
    pub hidden_answers: Vec<HiddenAnswersView>,
    pub audience_vote_questions: Vec<usize>,
    pub game_time: u64,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    /// Incremented on every persisted change; clients drop snapshots older than what they hold.
    pub version: u64,
}

impl GameSessionSummary {
    /// Letters hidden on the session's current question.
    pub fn hidden_on_current(&self) -> &[AnswerLetter] {
        self.hidden_answers
            .iter()
            .find(|hidden| hidden.question_index == self.current_question_index)
            .map(|hidden| hidden.letters.as_slice())
            .unwrap_or_default()
    }

    /// Whether an audience vote already ran on the current question.
    pub fn has_vote_results(&self) -> bool {
        self.audience_vote_questions
            .contains(&self.current_question_index)
    }
}

impl From<&GameSession> for GameSessionSummary {
    fn from(session: &GameSession) -> Self {
        Self {
            id: session.id,
            status: session.status,
            current_question_index: session.current_question_index,
            total_questions: session.total_questions,
            used_lifelines: session.used_lifelines,
            hidden_answers: session
                .hidden_answers
                .iter()
                .map(|(index, letters)| HiddenAnswersView {
                    question_index: *index,
                    letters: letters.clone(),
                })
                .collect(),
            audience_vote_questions: session.audience_vote_questions.iter().copied().collect(),
            game_time: session.game_time,
            start_time: session.start_time.map(format_system_time),
            end_time: session.end_time.map(format_system_time),
            created_at: format_system_time(session.created_at),
            updated_at: format_system_time(session.updated_at),
            version: session.version,
        }
    }
}
