use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{AnswerLetter, AnswerSet, QuestionEntity},
    dto::{
        format_system_time,
        validation::{validate_answer_letter, validate_answer_texts},
    },
};

/// Payload used to create or replace a question in the bank.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(custom(function = "validate_answer_texts"))]
    pub answers: AnswerSet,
    #[validate(custom(function = "validate_answer_letter"))]
    pub correct_answer: String,
}

/// Question as exposed to admins, correct answer included.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSummary {
    pub id: Uuid,
    pub content: String,
    pub answers: AnswerSet,
    pub correct_answer: AnswerLetter,
    pub created_at: String,
    pub updated_at: String,
}

impl From<QuestionEntity> for QuestionSummary {
    fn from(question: QuestionEntity) -> Self {
        Self {
            id: question.id,
            content: question.content,
            answers: question.answers,
            correct_answer: question.correct_answer,
            created_at: format_system_time(question.created_at),
            updated_at: format_system_time(question.updated_at),
        }
    }
}

/// Ids to remove in one call.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DeleteQuestionsRequest {
    #[validate(length(min = 1))]
    pub ids: Vec<Uuid>,
}
