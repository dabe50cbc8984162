use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use axum_valid::Valid;

use crate::{
    dto::{
        admin::{
            ActionResponse, AnswerRequest, DeletedCountResponse, GameTimeRequest, LifelineRequest,
            LifelineResponse, StartGameResponse, SubmitAnswerResponse,
        },
        game::GameSessionSummary,
        public::GameStateResponse,
        voting::VoteSessionSummary,
    },
    error::{AppError, ErrorBody},
    services::{
        admin_service,
        public_service::{self, SnapshotAudience},
        voting_service,
    },
    state::SharedState,
};

/// Host console endpoints driving the game and the audience vote.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/admin/state", get(admin_state))
        .route("/admin/game/start", post(start_game))
        .route("/admin/game/select", post(select_answer))
        .route("/admin/game/answer", post(submit_answer))
        .route("/admin/game/next", post(next_question))
        .route("/admin/game/previous", post(previous_question))
        .route("/admin/game/lifeline", post(use_lifeline))
        .route("/admin/game/stop", post(stop_game))
        .route("/admin/game/close", post(close_game))
        .route("/admin/game/time", put(update_game_time))
        .route(
            "/admin/sessions",
            get(list_sessions).delete(clear_all_sessions),
        )
        .route("/admin/voting/start", post(start_voting))
        .route("/admin/voting/end", post(end_voting))
        .route("/admin/voting/clear", post(clear_voting))
}

/// Snapshot for the host console, correct answer included.
#[utoipa::path(
    get,
    path = "/admin/state",
    tag = "admin",
    responses((status = 200, description = "Authoritative game state", body = GameStateResponse))
)]
pub async fn admin_state(
    State(state): State<SharedState>,
) -> Result<Json<GameStateResponse>, AppError> {
    Ok(Json(
        public_service::game_state(&state, SnapshotAudience::Admin).await?,
    ))
}

/// Start a new game with twelve questions drawn from the bank.
#[utoipa::path(
    post,
    path = "/admin/game/start",
    tag = "admin",
    responses(
        (status = 200, description = "Game started", body = StartGameResponse),
        (status = 409, description = "Fewer than twelve questions in the bank", body = ErrorBody)
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
) -> Result<Json<StartGameResponse>, AppError> {
    Ok(Json(admin_service::start_game(&state).await?))
}

/// Highlight an answer on every screen before it is locked in.
#[utoipa::path(
    post,
    path = "/admin/game/select",
    tag = "admin",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Selection broadcast", body = ActionResponse),
        (status = 400, description = "Answer outside A-D", body = ErrorBody),
        (status = 404, description = "No active game", body = ErrorBody)
    )
)]
pub async fn select_answer(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::select_answer(&state, payload).await?))
}

/// Lock in the final answer and reveal the result.
#[utoipa::path(
    post,
    path = "/admin/game/answer",
    tag = "admin",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer resolved", body = SubmitAnswerResponse),
        (status = 400, description = "Answer outside A-D", body = ErrorBody),
        (status = 404, description = "No active game", body = ErrorBody)
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AnswerRequest>>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    Ok(Json(admin_service::submit_answer(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/admin/game/next",
    tag = "admin",
    responses(
        (status = 200, description = "Moved to the next question", body = GameSessionSummary),
        (status = 404, description = "No active game or already on the last question", body = ErrorBody)
    )
)]
pub async fn next_question(
    State(state): State<SharedState>,
) -> Result<Json<GameSessionSummary>, AppError> {
    Ok(Json(admin_service::next_question(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/game/previous",
    tag = "admin",
    responses(
        (status = 200, description = "Moved back one question", body = GameSessionSummary),
        (status = 404, description = "No active game", body = ErrorBody)
    )
)]
pub async fn previous_question(
    State(state): State<SharedState>,
) -> Result<Json<GameSessionSummary>, AppError> {
    Ok(Json(admin_service::previous_question(&state).await?))
}

/// Consume a lifeline. askAudience also opens the audience vote.
#[utoipa::path(
    post,
    path = "/admin/game/lifeline",
    tag = "admin",
    request_body = LifelineRequest,
    responses(
        (status = 200, description = "Lifeline consumed", body = LifelineResponse),
        (status = 409, description = "Lifeline already used", body = ErrorBody)
    )
)]
pub async fn use_lifeline(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<LifelineRequest>>,
) -> Result<Json<LifelineResponse>, AppError> {
    Ok(Json(admin_service::use_lifeline(&state, payload).await?))
}

/// Abandon the running game.
#[utoipa::path(
    post,
    path = "/admin/game/stop",
    tag = "admin",
    responses(
        (status = 200, description = "Game finished", body = GameSessionSummary),
        (status = 404, description = "No active game", body = ErrorBody)
    )
)]
pub async fn stop_game(
    State(state): State<SharedState>,
) -> Result<Json<GameSessionSummary>, AppError> {
    Ok(Json(admin_service::stop_game(&state).await?))
}

/// Archive the running game. Same effect as stop.
#[utoipa::path(
    post,
    path = "/admin/game/close",
    tag = "admin",
    responses(
        (status = 200, description = "Game finished", body = GameSessionSummary),
        (status = 404, description = "No active game", body = ErrorBody)
    )
)]
pub async fn close_game(
    State(state): State<SharedState>,
) -> Result<Json<GameSessionSummary>, AppError> {
    Ok(Json(admin_service::stop_game(&state).await?))
}

/// Store the elapsed time reported by the host console.
#[utoipa::path(
    put,
    path = "/admin/game/time",
    tag = "admin",
    request_body = GameTimeRequest,
    responses(
        (status = 200, description = "Game time updated", body = GameSessionSummary),
        (status = 400, description = "Negative time", body = ErrorBody)
    )
)]
pub async fn update_game_time(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GameTimeRequest>>,
) -> Result<Json<GameSessionSummary>, AppError> {
    Ok(Json(admin_service::update_game_time(&state, payload).await?))
}

/// Session history, newest first.
#[utoipa::path(
    get,
    path = "/admin/sessions",
    tag = "admin",
    responses((status = 200, description = "Every recorded session", body = [GameSessionSummary]))
)]
pub async fn list_sessions(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameSessionSummary>>, AppError> {
    Ok(Json(admin_service::list_sessions(&state).await?))
}

/// Delete every session, history included.
#[utoipa::path(
    delete,
    path = "/admin/sessions",
    tag = "admin",
    responses((status = 200, description = "Sessions deleted", body = DeletedCountResponse))
)]
pub async fn clear_all_sessions(
    State(state): State<SharedState>,
) -> Result<Json<DeletedCountResponse>, AppError> {
    Ok(Json(admin_service::clear_all_sessions(&state).await?))
}

/// Open an audience vote on the current question without consuming the lifeline.
#[utoipa::path(
    post,
    path = "/admin/voting/start",
    tag = "voting",
    responses(
        (status = 200, description = "Vote opened", body = VoteSessionSummary),
        (status = 409, description = "A vote is already running", body = ErrorBody)
    )
)]
pub async fn start_voting(
    State(state): State<SharedState>,
) -> Result<Json<VoteSessionSummary>, AppError> {
    Ok(Json(voting_service::start_voting(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/voting/end",
    tag = "voting",
    responses(
        (status = 200, description = "Vote closed", body = VoteSessionSummary),
        (status = 400, description = "No vote is running", body = ErrorBody)
    )
)]
pub async fn end_voting(
    State(state): State<SharedState>,
) -> Result<Json<VoteSessionSummary>, AppError> {
    Ok(Json(voting_service::end_voting(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/voting/clear",
    tag = "voting",
    responses((status = 200, description = "Vote discarded", body = ActionResponse))
)]
pub async fn clear_voting(State(state): State<SharedState>) -> Json<ActionResponse> {
    Json(voting_service::clear_voting(&state).await)
}
