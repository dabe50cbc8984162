use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    dao::models::{AnswerLetter, AnswerSet, SessionStatus, UsedLifelines},
    state::{state_machine::Lifeline, voting::VoteEndReason},
};

pub const EVENT_CONNECTION_ESTABLISHED: &str = "connection-established";
pub const EVENT_QUESTION_CHANGED: &str = "question-changed";
pub const EVENT_ANSWER_SELECTED: &str = "answer-selected";
pub const EVENT_ANSWER_REVEALED: &str = "answer-revealed";
pub const EVENT_LIFELINE_USED: &str = "lifeline-used";
pub const EVENT_VOTING_STARTED: &str = "voting-started";
pub const EVENT_VOTING_ENDED: &str = "voting-ended";
pub const EVENT_GAME_ENDED: &str = "game-ended";

/// Query string of `GET /sse`.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SubscribeQuery {
    /// `admin`, `player` or `voter`.
    pub role: String,
    /// Reuse a client id across reconnects; generated when absent.
    pub client_id: Option<String>,
}

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: String,
    pub data: String,
}

/// Wire envelope wrapping every event: `{type, data, timestamp}`.
#[derive(Serialize)]
struct EnvelopeRef<'a, T: Serialize> {
    #[serde(rename = "type")]
    event_type: &'a str,
    data: &'a T,
    timestamp: &'a str,
}

impl ServerEvent {
    /// Serialise `payload` inside the envelope once, ready to be cloned to every recipient.
    pub fn envelope<T>(event_type: &str, payload: &T, timestamp: &str) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        let data = serde_json::to_string(&EnvelopeRef {
            event_type,
            data: payload,
            timestamp,
        })?;
        Ok(Self {
            event: event_type.to_string(),
            data,
        })
    }
}

/// Owned form of the envelope, used by stream consumers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Sent to a single client right after it registers.
pub struct ConnectionEstablishedEvent {
    pub client_id: String,
    pub server_time: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// The current question moved (start, next, previous). Question content is re-fetched.
pub struct QuestionChangedEvent {
    pub question_index: usize,
    pub total_questions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
    /// Seconds the per-question countdown starts from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_time_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// The host highlighted an answer before confirming it.
pub struct AnswerSelectedEvent {
    pub selected_answer: AnswerLetter,
    pub question_index: usize,
    pub question_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// The final answer was locked in and compared with the correct one.
pub struct AnswerRevealedEvent {
    pub selected_answer: AnswerLetter,
    pub correct_answer: AnswerLetter,
    pub is_correct: bool,
    pub question_index: usize,
    pub question_id: Uuid,
    pub game_won: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// A lifeline was consumed.
pub struct LifelineUsedEvent {
    pub lifeline: Lifeline,
    pub lifeline_name: String,
    pub question_index: usize,
    pub used_lifelines: UsedLifelines,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Question text and answers frozen when an audience vote starts.
pub struct VoteQuestion {
    pub id: Uuid,
    pub content: String,
    pub answers: AnswerSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// An audience vote opened. Voters get the question, other roles do not.
pub struct VotingStartedEvent {
    pub vote_session_id: Uuid,
    pub question_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<VoteQuestion>,
    /// Seconds the vote stays open.
    pub time_limit: u64,
    pub hidden_answers: Vec<AnswerLetter>,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// An audience vote closed, manually or by expiry.
pub struct VotingEndedEvent {
    pub vote_session_id: Uuid,
    pub end_time: String,
    pub total_votes: usize,
    pub reason: VoteEndReason,
}

/// Why a game ended outside of answer resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GameEndReason {
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// The game was stopped or cleared by the host.
pub struct GameEndedEvent {
    pub reason: GameEndReason,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wraps_payload_with_type_and_timestamp() {
        let event = ServerEvent::envelope(
            EVENT_GAME_ENDED,
            &GameEndedEvent {
                reason: GameEndReason::Manual,
                timestamp: "t0".into(),
            },
            "t1",
        )
        .unwrap();

        assert_eq!(event.event, "game-ended");
        let value: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "game-ended",
                "data": {"reason": "manual", "timestamp": "t0"},
                "timestamp": "t1",
            })
        );
    }

    #[test]
    fn question_changed_omits_absent_fields() {
        let value = serde_json::to_value(QuestionChangedEvent {
            question_index: 3,
            total_questions: 12,
            status: None,
            question_time_limit: None,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"questionIndex": 3, "totalQuestions": 12})
        );
    }
}
