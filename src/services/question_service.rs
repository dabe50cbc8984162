//! Question bank maintenance for the admin console.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{AnswerLetter, QuestionEntity},
    dto::{
        admin::DeletedCountResponse,
        question::{DeleteQuestionsRequest, QuestionInput, QuestionSummary},
    },
    error::ServiceError,
    state::SharedState,
};

/// Every question in the bank.
pub async fn list_questions(state: &SharedState) -> Result<Vec<QuestionSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    Ok(store
        .list_questions()
        .await?
        .into_iter()
        .map(QuestionSummary::from)
        .collect())
}

/// One question, correct answer included.
pub async fn get_question(state: &SharedState, id: Uuid) -> Result<QuestionSummary, ServiceError> {
    let store = state.require_game_store().await?;
    store
        .find_question(id)
        .await?
        .map(QuestionSummary::from)
        .ok_or_else(|| ServiceError::NotFound(format!("question `{id}` not found")))
}

/// Add a question to the bank.
pub async fn create_question(
    state: &SharedState,
    input: QuestionInput,
) -> Result<QuestionSummary, ServiceError> {
    input.validate()?;
    let correct_answer: AnswerLetter = input.correct_answer.parse()?;
    let store = state.require_game_store().await?;

    let now = SystemTime::now();
    let question = QuestionEntity {
        id: Uuid::new_v4(),
        content: input.content.trim().to_string(),
        answers: input.answers,
        correct_answer,
        created_at: now,
        updated_at: now,
    };
    store.save_question(question.clone()).await?;
    info!(question_id = %question.id, "question created");
    Ok(question.into())
}

/// Replace the text, answers and correct letter of an existing question.
///
/// Sessions reference questions by id, so a running game sees the edit on its
/// next fetch.
pub async fn update_question(
    state: &SharedState,
    id: Uuid,
    input: QuestionInput,
) -> Result<QuestionSummary, ServiceError> {
    input.validate()?;
    let correct_answer: AnswerLetter = input.correct_answer.parse()?;
    let store = state.require_game_store().await?;

    let Some(existing) = store.find_question(id).await? else {
        return Err(ServiceError::NotFound(format!("question `{id}` not found")));
    };
    let question = QuestionEntity {
        content: input.content.trim().to_string(),
        answers: input.answers,
        correct_answer,
        updated_at: SystemTime::now(),
        ..existing
    };
    store.save_question(question.clone()).await?;
    Ok(question.into())
}

pub async fn delete_question(state: &SharedState, id: Uuid) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    if store.delete_question(id).await? {
        Ok(())
    } else {
        Err(ServiceError::NotFound(format!("question `{id}` not found")))
    }
}

/// Delete the listed questions, returning how many existed.
pub async fn delete_questions(
    state: &SharedState,
    request: DeleteQuestionsRequest,
) -> Result<DeletedCountResponse, ServiceError> {
    request.validate()?;
    let store = state.require_game_store().await?;
    let deleted_count = store.delete_questions(request.ids).await?;
    Ok(DeletedCountResponse { deleted_count })
}

/// Empty the bank.
pub async fn delete_all_questions(state: &SharedState) -> Result<DeletedCountResponse, ServiceError> {
    let store = state.require_game_store().await?;
    let deleted_count = store.delete_all_questions().await?;
    info!(deleted_count, "question bank emptied");
    Ok(DeletedCountResponse { deleted_count })
}
