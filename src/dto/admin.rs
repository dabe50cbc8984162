//! DTO definitions used by the admin REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{AnswerLetter, SessionStatus, UsedLifelines},
    dto::{
        game::GameSessionSummary,
        validation::{validate_answer_letter, validate_lifeline},
        voting::VoteSessionSummary,
    },
    state::state_machine::Lifeline,
};

/// Request carrying an answer letter (`A`-`D`).
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AnswerRequest {
    #[validate(custom(function = "validate_answer_letter"))]
    pub answer: String,
}

/// Request naming the lifeline to consume.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LifelineRequest {
    #[validate(custom(function = "validate_lifeline"))]
    pub lifeline: String,
}

/// Client-reported elapsed game time.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GameTimeRequest {
    #[validate(range(min = 0))]
    pub seconds: i64,
}

/// Returned once a new game has been created.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartGameResponse {
    pub session: GameSessionSummary,
    /// Question ids in play order.
    pub question_ids: Vec<Uuid>,
}

/// Outcome of the final answer for the current question.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub selected_answer: AnswerLetter,
    pub correct_answer: AnswerLetter,
    pub is_correct: bool,
    pub game_won: bool,
    pub question_index: usize,
    pub status: SessionStatus,
}

/// Result of consuming a lifeline.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LifelineResponse {
    pub lifeline: Lifeline,
    pub used_lifelines: UsedLifelines,
    /// Letters removed from the current question by fifty-fifty.
    pub hidden_answers: Vec<AnswerLetter>,
    /// Audience vote opened by askAudience; absent if it could not start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_session: Option<VoteSessionSummary>,
}

/// Number of records removed by a bulk delete.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedCountResponse {
    pub deleted_count: u64,
}

/// Generic action acknowledgement used by admin endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_game_time_is_rejected() {
        assert!(GameTimeRequest { seconds: -1 }.validate().is_err());
        assert!(GameTimeRequest { seconds: 0 }.validate().is_ok());
    }

    #[test]
    fn answer_requests_only_accept_letters() {
        let ok = AnswerRequest {
            answer: "C".into(),
        };
        let bad = AnswerRequest {
            answer: "Z".into(),
        };
        assert!(ok.validate().is_ok());
        assert!(bad.validate().is_err());
    }
}
