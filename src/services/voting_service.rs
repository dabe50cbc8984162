//! Audience vote operations layered over [`VotingManager`](crate::state::VotingManager).

use std::time::SystemTime;

use tracing::{info, warn};

use crate::{
    dao::models::AnswerLetter,
    dto::{
        admin::ActionResponse,
        sse::VoteQuestion,
        voting::{CurrentVotingResponse, VoteRequest, VoteResponse, VoteSessionSummary, VoteStatsResponse},
    },
    error::ServiceError,
    services::game_service,
    state::{
        SharedState,
        transitions::{load_active_session, mutate_active_session},
        voting::{VoteEndReason, VoteTarget},
    },
};

/// Open an audience vote on the active session's current question.
pub async fn start_voting(state: &SharedState) -> Result<VoteSessionSummary, ServiceError> {
    state
        .run_transition("start_voting", || start_voting_locked(state))
        .await
}

/// Body of [`start_voting`] for callers already holding the transition gate.
pub(crate) async fn start_voting_locked(
    state: &SharedState,
) -> Result<VoteSessionSummary, ServiceError> {
    let store = state.require_game_store().await?;
    let session = load_active_session(&store).await?;
    let question = game_service::current_question(&store, &session).await?;

    let vote = state
        .voting()
        .start(VoteTarget {
            game_session_id: session.id,
            question_index: session.current_question_index,
            question: VoteQuestion {
                id: question.id,
                content: question.content,
                answers: question.answers,
            },
            hidden_answers: session.hidden_on_current().to_vec(),
        })
        .await?;

    // The marker only drives a "has results" badge; the vote itself is already running.
    let index = vote.question_index;
    if let Err(err) = mutate_active_session(&store, |session| {
        Ok(session.mark_audience_vote(index, SystemTime::now()))
    })
    .await
    {
        warn!(error = %err, question_index = index, "failed to record audience vote marker");
    }

    Ok(VoteSessionSummary::from(&vote))
}

/// Close the running vote on behalf of the host.
pub async fn end_voting(state: &SharedState) -> Result<VoteSessionSummary, ServiceError> {
    let session = state.voting().end(VoteEndReason::Manual).await?;
    Ok(VoteSessionSummary::from(&session))
}

/// Discard the current vote session and its ballots.
pub async fn clear_voting(state: &SharedState) -> ActionResponse {
    state.voting().clear().await;
    info!("audience vote cleared by admin");
    ActionResponse {
        message: "voting cleared".into(),
    }
}

/// Record a ballot in the running vote.
pub async fn submit_vote(
    state: &SharedState,
    request: VoteRequest,
) -> Result<VoteResponse, ServiceError> {
    let option: AnswerLetter = request.option.parse()?;
    let vote = state.voting().submit_vote(&request.voter_id, option).await?;
    Ok(VoteResponse::new(request.voter_id.trim(), &vote))
}

/// Tally of the current or last vote.
pub async fn stats(state: &SharedState) -> VoteStatsResponse {
    state.voting().stats().await
}

pub async fn current(state: &SharedState) -> CurrentVotingResponse {
    CurrentVotingResponse {
        session: state
            .voting()
            .current()
            .await
            .as_ref()
            .map(VoteSessionSummary::from),
    }
}

/// The ballot `voter_id` holds in the current session.
pub async fn my_vote(state: &SharedState, voter_id: &str) -> Result<VoteResponse, ServiceError> {
    state
        .voting()
        .vote_of(voter_id)
        .await
        .map(|vote| VoteResponse::new(voter_id.trim(), &vote))
        .ok_or_else(|| ServiceError::NotFound(format!("no vote recorded for `{voter_id}`")))
}
