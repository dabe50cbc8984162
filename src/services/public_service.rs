//! Reconciliation snapshots: the authoritative state clients pull on connect,
//! on every heartbeat and whenever an event hints that something changed.

use tracing::warn;

use crate::{
    dto::{
        game::GameSessionSummary,
        public::{GameStateResponse, QuestionView},
        voting::VoteSessionSummary,
    },
    error::ServiceError,
    services::game_service,
    state::{SharedState, state_machine::GameSession},
};

/// Which audience a snapshot is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotAudience {
    /// Player and voter screens: the correct answer stays hidden until revealed.
    Public,
    /// Host console: always carries the correct answer.
    Admin,
}

/// Build the snapshot for `audience`.
///
/// Falls back to the most recent session when none is active so screens can
/// keep showing how the last game ended. In degraded mode the snapshot only
/// carries the in-memory voting state.
pub async fn game_state(
    state: &SharedState,
    audience: SnapshotAudience,
) -> Result<GameStateResponse, ServiceError> {
    let mut snapshot = GameStateResponse {
        session: None,
        question: None,
        selected_answer: None,
        reveal: None,
        question_time_limit: state.config().question_time_limit_secs(),
        voting: state
            .voting()
            .current()
            .await
            .as_ref()
            .map(VoteSessionSummary::from),
        degraded: state.is_degraded().await,
    };

    let store = match state.require_game_store().await {
        Ok(store) => store,
        Err(ServiceError::Degraded) => return Ok(snapshot),
        Err(err) => return Err(err),
    };

    let entity = match store.find_active_session().await? {
        Some(active) => Some(active),
        None => store.list_sessions().await?.into_iter().next(),
    };
    let Some(session) = entity.map(GameSession::from) else {
        return Ok(snapshot);
    };

    let (selected_answer, reveal) = state
        .board()
        .read()
        .await
        .view(session.id, session.current_question_index);

    snapshot.question = match game_service::current_question(&store, &session).await {
        Ok(question) => {
            let show_correct = audience == SnapshotAudience::Admin || reveal.is_some();
            Some(QuestionView {
                id: question.id,
                content: question.content,
                answers: question.answers,
                hidden_answers: session.hidden_on_current().to_vec(),
                correct_answer: show_correct.then_some(question.correct_answer),
            })
        }
        Err(ServiceError::NotFound(reason)) => {
            warn!(session_id = %session.id, %reason, "snapshot without current question");
            None
        }
        Err(err) => return Err(err),
    };
    snapshot.session = Some(GameSessionSummary::from(&session));
    snapshot.selected_answer = selected_answer;
    snapshot.reveal = reveal;

    Ok(snapshot)
}
