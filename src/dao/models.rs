use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, time::SystemTime};
use utoipa::ToSchema;
use uuid::Uuid;

/// One of the four answer slots of a question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    /// All letters in display order.
    pub const ALL: [AnswerLetter; 4] = [
        AnswerLetter::A,
        AnswerLetter::B,
        AnswerLetter::C,
        AnswerLetter::D,
    ];

    /// Single-letter representation used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            AnswerLetter::A => "A",
            AnswerLetter::B => "B",
            AnswerLetter::C => "C",
            AnswerLetter::D => "D",
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string is not one of `A`, `B`, `C` or `D`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{0}` is not a valid answer (expected A, B, C or D)")]
pub struct InvalidAnswerLetter(pub String);

impl FromStr for AnswerLetter {
    type Err = InvalidAnswerLetter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "A" => Ok(AnswerLetter::A),
            "B" => Ok(AnswerLetter::B),
            "C" => Ok(AnswerLetter::C),
            "D" => Ok(AnswerLetter::D),
            other => Err(InvalidAnswerLetter(other.to_string())),
        }
    }
}

/// The four answer texts of a question, keyed by letter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct AnswerSet {
    #[serde(rename = "A")]
    pub a: String,
    #[serde(rename = "B")]
    pub b: String,
    #[serde(rename = "C")]
    pub c: String,
    #[serde(rename = "D")]
    pub d: String,
}

impl AnswerSet {
    /// Text of the answer stored under `letter`.
    pub fn get(&self, letter: AnswerLetter) -> &str {
        match letter {
            AnswerLetter::A => &self.a,
            AnswerLetter::B => &self.b,
            AnswerLetter::C => &self.c,
            AnswerLetter::D => &self.d,
        }
    }
}

/// Question owned by the question bank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Question text shown to players.
    pub content: String,
    /// Answer texts keyed A–D.
    pub answers: AnswerSet,
    /// Letter of the right answer.
    pub correct_answer: AnswerLetter,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the question was edited.
    pub updated_at: SystemTime,
}

impl QuestionEntity {
    /// Letters of every answer except the correct one, in A–D order.
    pub fn incorrect_answers(&self) -> Vec<AnswerLetter> {
        AnswerLetter::ALL
            .into_iter()
            .filter(|letter| *letter != self.correct_answer)
            .collect()
    }
}

/// Lifecycle status of a persisted game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Created but never started (not produced by any transition today).
    Inactive,
    /// The one game currently being played.
    Active,
    /// Reserved; no transition produces or consumes it.
    Paused,
    /// Won, lost or stopped. Immutable from then on.
    Finished,
}

/// Which of the three single-use lifelines have been consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsedLifelines {
    pub fifty_fifty: bool,
    pub phone_a_friend: bool,
    pub ask_audience: bool,
}

/// Answers hidden by the fifty-fifty lifeline for one question index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HiddenAnswersEntity {
    pub question_index: usize,
    pub letters: Vec<AnswerLetter>,
}

/// Persisted representation of one played game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSessionEntity {
    /// Primary key of the session.
    pub id: Uuid,
    pub status: SessionStatus,
    /// Zero-based pointer into the session's ordered questions.
    pub current_question_index: usize,
    pub total_questions: usize,
    pub used_lifelines: UsedLifelines,
    pub hidden_answers: Vec<HiddenAnswersEntity>,
    /// Question indices for which an audience vote took place.
    pub audience_vote_questions: Vec<usize>,
    /// Client-reported elapsed seconds.
    pub game_time: u64,
    pub start_time: Option<SystemTime>,
    pub end_time: Option<SystemTime>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    /// Incremented on every persisted update.
    pub version: u64,
}

/// Ordered association between a session and one of its questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSessionQuestionEntity {
    pub game_session_id: Uuid,
    pub question_id: Uuid,
    /// Position of the question in the session, unique per session.
    pub order: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_letter_parses_only_known_letters() {
        assert_eq!("B".parse::<AnswerLetter>(), Ok(AnswerLetter::B));
        assert_eq!(" D ".parse::<AnswerLetter>(), Ok(AnswerLetter::D));
        assert!("E".parse::<AnswerLetter>().is_err());
        assert!("".parse::<AnswerLetter>().is_err());
        assert!("AB".parse::<AnswerLetter>().is_err());
    }

    #[test]
    fn used_lifelines_use_camel_case_keys() {
        let value = serde_json::to_value(UsedLifelines {
            fifty_fifty: true,
            phone_a_friend: false,
            ask_audience: true,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"fiftyFifty": true, "phoneAFriend": false, "askAudience": true})
        );
    }
}
