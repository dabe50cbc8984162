use std::time::{Duration, SystemTime, UNIX_EPOCH};

use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{
    AnswerLetter, AnswerSet, GameSessionEntity, GameSessionQuestionEntity, HiddenAnswersEntity,
    QuestionEntity, SessionStatus, UsedLifelines,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuestionDocument {
    #[serde(rename = "_id")]
    id: String,
    content: String,
    answers: AnswerSet,
    correct_answer: AnswerLetter,
    created_at_ms: i64,
    updated_at_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoHiddenAnswers {
    question_index: i64,
    letters: Vec<AnswerLetter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    id: String,
    status: SessionStatus,
    current_question_index: i64,
    total_questions: i64,
    used_lifelines: UsedLifelines,
    #[serde(default)]
    hidden_answers: Vec<MongoHiddenAnswers>,
    #[serde(default)]
    audience_vote_questions: Vec<i64>,
    game_time: i64,
    start_time_ms: Option<i64>,
    end_time_ms: Option<i64>,
    created_at_ms: i64,
    updated_at_ms: i64,
    version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionQuestionDocument {
    game_session_id: String,
    question_id: String,
    order: i64,
}

/// Milliseconds since the epoch; times before it clamp to zero.
pub fn to_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

fn from_millis(millis: i64) -> SystemTime {
    UNIX_EPOCH + Duration::from_millis(millis.max(0) as u64)
}

fn parse_id(raw: &str) -> MongoResult<Uuid> {
    Uuid::parse_str(raw).map_err(|source| MongoDaoError::CorruptDocument {
        id: raw.to_owned(),
        source,
    })
}

/// Filter matching the document with `id`.
pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": id.to_string()}
}

impl From<QuestionEntity> for MongoQuestionDocument {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            content: value.content,
            answers: value.answers,
            correct_answer: value.correct_answer,
            created_at_ms: to_millis(value.created_at),
            updated_at_ms: to_millis(value.updated_at),
        }
    }
}

impl TryFrom<MongoQuestionDocument> for QuestionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoQuestionDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(&value.id)?,
            content: value.content,
            answers: value.answers,
            correct_answer: value.correct_answer,
            created_at: from_millis(value.created_at_ms),
            updated_at: from_millis(value.updated_at_ms),
        })
    }
}

impl From<GameSessionEntity> for MongoSessionDocument {
    fn from(value: GameSessionEntity) -> Self {
        Self {
            id: value.id.to_string(),
            status: value.status,
            current_question_index: value.current_question_index as i64,
            total_questions: value.total_questions as i64,
            used_lifelines: value.used_lifelines,
            hidden_answers: value
                .hidden_answers
                .into_iter()
                .map(|hidden| MongoHiddenAnswers {
                    question_index: hidden.question_index as i64,
                    letters: hidden.letters,
                })
                .collect(),
            audience_vote_questions: value
                .audience_vote_questions
                .into_iter()
                .map(|index| index as i64)
                .collect(),
            game_time: value.game_time as i64,
            start_time_ms: value.start_time.map(to_millis),
            end_time_ms: value.end_time.map(to_millis),
            created_at_ms: to_millis(value.created_at),
            updated_at_ms: to_millis(value.updated_at),
            version: value.version as i64,
        }
    }
}

impl TryFrom<MongoSessionDocument> for GameSessionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSessionDocument) -> MongoResult<Self> {
        Ok(Self {
            id: parse_id(&value.id)?,
            status: value.status,
            current_question_index: value.current_question_index.max(0) as usize,
            total_questions: value.total_questions.max(0) as usize,
            used_lifelines: value.used_lifelines,
            hidden_answers: value
                .hidden_answers
                .into_iter()
                .map(|hidden| HiddenAnswersEntity {
                    question_index: hidden.question_index.max(0) as usize,
                    letters: hidden.letters,
                })
                .collect(),
            audience_vote_questions: value
                .audience_vote_questions
                .into_iter()
                .map(|index| index.max(0) as usize)
                .collect(),
            game_time: value.game_time.max(0) as u64,
            start_time: value.start_time_ms.map(from_millis),
            end_time: value.end_time_ms.map(from_millis),
            created_at: from_millis(value.created_at_ms),
            updated_at: from_millis(value.updated_at_ms),
            version: value.version.max(0) as u64,
        })
    }
}

impl From<GameSessionQuestionEntity> for MongoSessionQuestionDocument {
    fn from(value: GameSessionQuestionEntity) -> Self {
        Self {
            game_session_id: value.game_session_id.to_string(),
            question_id: value.question_id.to_string(),
            order: value.order as i64,
        }
    }
}

impl TryFrom<MongoSessionQuestionDocument> for GameSessionQuestionEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoSessionQuestionDocument) -> MongoResult<Self> {
        Ok(Self {
            game_session_id: parse_id(&value.game_session_id)?,
            question_id: parse_id(&value.question_id)?,
            order: value.order.max(0) as usize,
        })
    }
}
