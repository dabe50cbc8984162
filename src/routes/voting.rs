use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::voting::{CurrentVotingResponse, VoteRequest, VoteResponse, VoteStatsResponse},
    error::{AppError, ErrorBody},
    services::voting_service,
    state::SharedState,
};

/// Audience endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/voting/vote", post(submit_vote))
        .route("/voting/current", get(current_voting))
        .route("/voting/stats", get(voting_stats))
        .route("/voting/votes/{voter_id}", get(my_vote))
}

/// Cast or change a vote while the poll is open.
#[utoipa::path(
    post,
    path = "/voting/vote",
    tag = "voting",
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote recorded", body = VoteResponse),
        (status = 404, description = "No vote session", body = ErrorBody),
        (status = 409, description = "The vote is closed", body = ErrorBody)
    )
)]
pub async fn submit_vote(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<VoteRequest>>,
) -> Result<Json<VoteResponse>, AppError> {
    Ok(Json(voting_service::submit_vote(&state, payload).await?))
}

#[utoipa::path(
    get,
    path = "/voting/current",
    tag = "voting",
    responses((status = 200, description = "Current or last vote session", body = CurrentVotingResponse))
)]
pub async fn current_voting(State(state): State<SharedState>) -> Json<CurrentVotingResponse> {
    Json(voting_service::current(&state).await)
}

/// Tally per option. Zeroed when no vote exists.
#[utoipa::path(
    get,
    path = "/voting/stats",
    tag = "voting",
    responses((status = 200, description = "Vote tally", body = VoteStatsResponse))
)]
pub async fn voting_stats(State(state): State<SharedState>) -> Json<VoteStatsResponse> {
    Json(voting_service::stats(&state).await)
}

#[utoipa::path(
    get,
    path = "/voting/votes/{voter_id}",
    tag = "voting",
    params(("voter_id" = String, Path, description = "Voter identifier")),
    responses(
        (status = 200, description = "The voter's current choice", body = VoteResponse),
        (status = 404, description = "No vote recorded", body = ErrorBody)
    )
)]
pub async fn my_vote(
    State(state): State<SharedState>,
    Path(voter_id): Path<String>,
) -> Result<Json<VoteResponse>, AppError> {
    Ok(Json(voting_service::my_vote(&state, &voter_id).await?))
}
