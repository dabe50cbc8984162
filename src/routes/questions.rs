use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::{
        admin::DeletedCountResponse,
        question::{DeleteQuestionsRequest, QuestionInput, QuestionSummary},
    },
    error::{AppError, ErrorBody},
    services::question_service,
    state::SharedState,
};

/// Question bank CRUD for the host console.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/admin/questions",
            get(list_questions)
                .post(create_question)
                .delete(delete_all_questions),
        )
        .route("/admin/questions/bulk-delete", post(delete_questions))
        .route(
            "/admin/questions/{id}",
            get(get_question).put(update_question).delete(delete_question),
        )
}

#[utoipa::path(
    get,
    path = "/admin/questions",
    tag = "questions",
    responses((status = 200, description = "Whole question bank", body = [QuestionSummary]))
)]
pub async fn list_questions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<QuestionSummary>>, AppError> {
    Ok(Json(question_service::list_questions(&state).await?))
}

#[utoipa::path(
    get,
    path = "/admin/questions/{id}",
    tag = "questions",
    params(("id" = String, Path, description = "Question identifier")),
    responses(
        (status = 200, description = "Question", body = QuestionSummary),
        (status = 404, description = "Unknown question", body = ErrorBody)
    )
)]
pub async fn get_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuestionSummary>, AppError> {
    Ok(Json(question_service::get_question(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/admin/questions",
    tag = "questions",
    request_body = QuestionInput,
    responses(
        (status = 201, description = "Question created", body = QuestionSummary),
        (status = 400, description = "Invalid question", body = ErrorBody)
    )
)]
pub async fn create_question(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<(StatusCode, Json<QuestionSummary>), AppError> {
    let created = question_service::create_question(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/admin/questions/{id}",
    tag = "questions",
    params(("id" = String, Path, description = "Question identifier")),
    request_body = QuestionInput,
    responses(
        (status = 200, description = "Question replaced", body = QuestionSummary),
        (status = 404, description = "Unknown question", body = ErrorBody)
    )
)]
pub async fn update_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<QuestionInput>>,
) -> Result<Json<QuestionSummary>, AppError> {
    Ok(Json(
        question_service::update_question(&state, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/questions/{id}",
    tag = "questions",
    params(("id" = String, Path, description = "Question identifier")),
    responses(
        (status = 204, description = "Question deleted"),
        (status = 404, description = "Unknown question", body = ErrorBody)
    )
)]
pub async fn delete_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    question_service::delete_question(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/questions/bulk-delete",
    tag = "questions",
    request_body = DeleteQuestionsRequest,
    responses((status = 200, description = "Questions deleted", body = DeletedCountResponse))
)]
pub async fn delete_questions(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<DeleteQuestionsRequest>>,
) -> Result<Json<DeletedCountResponse>, AppError> {
    Ok(Json(
        question_service::delete_questions(&state, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/admin/questions",
    tag = "questions",
    responses((status = 200, description = "Question bank emptied", body = DeletedCountResponse))
)]
pub async fn delete_all_questions(
    State(state): State<SharedState>,
) -> Result<Json<DeletedCountResponse>, AppError> {
    Ok(Json(question_service::delete_all_questions(&state).await?))
}
