use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::AnswerLetter,
    dto::{format_system_time, sse::VoteQuestion, validation::validate_answer_letter},
    state::voting::{Vote, VoteSession},
};

/// A voter's ballot.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[validate(length(min = 1, max = 128))]
    pub voter_id: String,
    #[validate(custom(function = "validate_answer_letter"))]
    pub option: String,
}

/// The vote currently recorded for one voter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub voter_id: String,
    pub option: AnswerLetter,
    pub timestamp: String,
}

impl VoteResponse {
    /// Wire form of `vote` cast by `voter_id`.
    pub fn new(voter_id: impl Into<String>, vote: &Vote) -> Self {
        Self {
            voter_id: voter_id.into(),
            option: vote.option,
            timestamp: format_system_time(vote.timestamp),
        }
    }
}

/// Tally for one answer letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptionStats {
    pub option: AnswerLetter,
    pub count: usize,
    /// Rounded independently per option, so the four may not add up to 100.
    pub percentage: u32,
}

/// Vote tally. Zeroed when no vote session exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatsResponse {
    pub vote_session_id: Option<Uuid>,
    pub is_active: bool,
    pub total_votes: usize,
    pub options: Vec<OptionStats>,
}

impl VoteStatsResponse {
    /// Count for a single letter.
    pub fn count(&self, option: AnswerLetter) -> usize {
        self.options
            .iter()
            .find(|stats| stats.option == option)
            .map(|stats| stats.count)
            .unwrap_or(0)
    }
}

/// Snapshot of the current or last audience vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteSessionSummary {
    pub id: Uuid,
    pub game_session_id: Uuid,
    pub question_id: Uuid,
    pub question_index: usize,
    pub question: VoteQuestion,
    pub hidden_answers: Vec<AnswerLetter>,
    pub start_time: String,
    pub end_time: String,
    /// Seconds the vote stays open.
    pub time_limit: u64,
    pub is_active: bool,
}

impl From<&VoteSession> for VoteSessionSummary {
    fn from(session: &VoteSession) -> Self {
        Self {
            id: session.id,
            game_session_id: session.game_session_id,
            question_id: session.question.id,
            question_index: session.question_index,
            question: session.question.clone(),
            hidden_answers: session.hidden_answers.clone(),
            start_time: format_system_time(session.start_time),
            end_time: format_system_time(session.end_time),
            time_limit: session.time_limit.as_secs(),
            is_active: session.is_active,
        }
    }
}

/// Current vote session, `null` when none was started.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentVotingResponse {
    pub session: Option<VoteSessionSummary>,
}
