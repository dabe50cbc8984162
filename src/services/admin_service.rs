//! Business logic behind the admin game controls. Every transition runs under
//! the transition gate, persists the session first and only broadcasts once
//! the write went through.

use std::time::SystemTime;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{AnswerLetter, GameSessionQuestionEntity},
    dto::{
        admin::{
            ActionResponse, AnswerRequest, DeletedCountResponse, GameTimeRequest, LifelineRequest,
            LifelineResponse, StartGameResponse, SubmitAnswerResponse,
        },
        game::GameSessionSummary,
        public::AnswerRevealView,
    },
    error::ServiceError,
    services::{game_service, sse_events, voting_service},
    state::{
        SharedState,
        state_machine::{AnswerOutcome, GameSession, Lifeline, pick_hidden_answers},
        transitions::{apply_and_persist, load_active_session, mutate_active_session},
    },
};

// ---------------------------------------------------------------------------
// Game lifecycle
// ---------------------------------------------------------------------------

/// Draw twelve questions, retire any running game and start a new one on question 0.
pub async fn start_game(state: &SharedState) -> Result<StartGameResponse, ServiceError> {
    state
        .run_transition("start_game", move || async move {
            let store = state.require_game_store().await?;
            let bank = store.list_questions().await?;
            let questions = game_service::sample_questions(bank, &mut rand::rng())?;

            let session = GameSession::start(Uuid::new_v4(), questions.len(), SystemTime::now());
            let question_ids: Vec<Uuid> = questions.iter().map(|question| question.id).collect();
            let associations = question_ids
                .iter()
                .enumerate()
                .map(|(order, question_id)| GameSessionQuestionEntity {
                    game_session_id: session.id,
                    question_id: *question_id,
                    order,
                })
                .collect();
            let retired = store.begin_session(session.clone().into(), associations).await?;
            if retired > 0 {
                info!(retired, "finished previous active session before starting a new game");
            }

            state.voting().clear().await;
            state.board().write().await.reset(session.id, 0);
            sse_events::broadcast_question_changed(
                state.hub(),
                &session,
                state.config().question_time_limit_secs(),
            );
            info!(session_id = %session.id, "game started");

            Ok(StartGameResponse {
                session: GameSessionSummary::from(&session),
                question_ids,
            })
        })
        .await
}

/// Force-end the active game without win or loss. Also serves `close`.
pub async fn stop_game(state: &SharedState) -> Result<GameSessionSummary, ServiceError> {
    state
        .run_transition("stop_game", move || async move {
            let store = state.require_game_store().await?;
            let (session, ()) =
                mutate_active_session(&store, |session| session.finish(SystemTime::now())).await?;

            state.voting().clear().await;
            state.board().write().await.clear();
            sse_events::broadcast_game_ended(state.hub());
            info!(session_id = %session.id, "game stopped by admin");

            Ok(GameSessionSummary::from(&session))
        })
        .await
}

/// Overwrite the client-reported elapsed time of the active game.
pub async fn update_game_time(
    state: &SharedState,
    request: GameTimeRequest,
) -> Result<GameSessionSummary, ServiceError> {
    let seconds = u64::try_from(request.seconds).map_err(|_| {
        ServiceError::InvalidInput("game time must be a non-negative number of seconds".into())
    })?;

    state
        .run_transition("update_game_time", move || async move {
            let store = state.require_game_store().await?;
            let (session, ()) = mutate_active_session(&store, |session| {
                session.set_game_time(seconds, SystemTime::now())
            })
            .await?;
            Ok(GameSessionSummary::from(&session))
        })
        .await
}

// ---------------------------------------------------------------------------
// Question flow
// ---------------------------------------------------------------------------

/// Highlight an answer before it is locked in. Nothing is persisted.
pub async fn select_answer(
    state: &SharedState,
    request: AnswerRequest,
) -> Result<ActionResponse, ServiceError> {
    let answer: AnswerLetter = request.answer.parse()?;

    state
        .run_transition("select_answer", move || async move {
            let store = state.require_game_store().await?;
            let session = load_active_session(&store).await?;
            let question = game_service::current_question(&store, &session).await?;

            state
                .board()
                .write()
                .await
                .select(session.id, session.current_question_index, answer);
            sse_events::broadcast_answer_selected(state.hub(), &session, &question, answer);

            Ok(ActionResponse {
                message: format!("answer {answer} selected"),
            })
        })
        .await
}

/// Lock in the contestant's answer and reveal the result.
pub async fn submit_answer(
    state: &SharedState,
    request: AnswerRequest,
) -> Result<SubmitAnswerResponse, ServiceError> {
    let answer: AnswerLetter = request.answer.parse()?;

    state
        .run_transition("submit_answer", move || async move {
            let store = state.require_game_store().await?;
            let current = load_active_session(&store).await?;
            let question = game_service::current_question(&store, &current).await?;
            let question_index = current.current_question_index;
            let is_correct = answer == question.correct_answer;

            let (session, outcome) = apply_and_persist(&store, &current, |session| {
                session.resolve_answer(is_correct, SystemTime::now())
            })
            .await?;
            let game_won = matches!(outcome, AnswerOutcome::Won);

            // The question is settled, so any audience vote on it is moot.
            state.voting().clear().await;
            state.board().write().await.reveal(
                session.id,
                question_index,
                AnswerRevealView {
                    selected_answer: answer,
                    correct_answer: question.correct_answer,
                    is_correct,
                    game_won,
                },
            );
            sse_events::broadcast_answer_revealed(
                state.hub(),
                &question,
                question_index,
                answer,
                game_won,
            );
            info!(
                session_id = %session.id,
                question_index,
                %answer,
                is_correct,
                game_won,
                "answer submitted"
            );

            Ok(SubmitAnswerResponse {
                selected_answer: answer,
                correct_answer: question.correct_answer,
                is_correct,
                game_won,
                question_index,
                status: session.status,
            })
        })
        .await
}

/// Move to the next question. Fails with not-found on the last one.
pub async fn next_question(state: &SharedState) -> Result<GameSessionSummary, ServiceError> {
    state
        .run_transition("next_question", move || async move {
            let store = state.require_game_store().await?;
            let (session, index) =
                mutate_active_session(&store, |session| session.advance(SystemTime::now())).await?;

            state.voting().clear().await;
            state.board().write().await.reset(session.id, index);
            sse_events::broadcast_question_changed(
                state.hub(),
                &session,
                state.config().question_time_limit_secs(),
            );

            Ok(GameSessionSummary::from(&session))
        })
        .await
}

/// Step back one question, clamped at the first. Leaves any audience vote alone.
pub async fn previous_question(state: &SharedState) -> Result<GameSessionSummary, ServiceError> {
    state
        .run_transition("previous_question", move || async move {
            let store = state.require_game_store().await?;
            let (session, index) =
                mutate_active_session(&store, |session| session.rewind(SystemTime::now())).await?;

            state.board().write().await.reset(session.id, index);
            sse_events::broadcast_question_changed(
                state.hub(),
                &session,
                state.config().question_time_limit_secs(),
            );

            Ok(GameSessionSummary::from(&session))
        })
        .await
}

/// Consume a lifeline on the current question.
///
/// askAudience opens the audience vote once the flag is stored. If the vote
/// cannot start the lifeline stays consumed.
pub async fn use_lifeline(
    state: &SharedState,
    request: LifelineRequest,
) -> Result<LifelineResponse, ServiceError> {
    let lifeline: Lifeline = request.lifeline.parse()?;

    state
        .run_transition("use_lifeline", move || async move {
            let store = state.require_game_store().await?;
            let current = load_active_session(&store).await?;

            let hidden = match lifeline {
                Lifeline::FiftyFifty => {
                    let question = game_service::current_question(&store, &current).await?;
                    Some(pick_hidden_answers(question.correct_answer, &mut rand::rng()))
                }
                Lifeline::PhoneAFriend | Lifeline::AskAudience => None,
            };

            let (session, ()) = apply_and_persist(&store, &current, |session| {
                session.use_lifeline(lifeline, hidden, SystemTime::now())
            })
            .await?;
            sse_events::broadcast_lifeline_used(state.hub(), &session, lifeline);
            info!(session_id = %session.id, %lifeline, "lifeline used");

            let vote_session = if lifeline == Lifeline::AskAudience {
                match voting_service::start_voting_locked(state).await {
                    Ok(vote) => Some(vote),
                    Err(err) => {
                        warn!(error = %err, "audience vote failed to start; lifeline stays used");
                        None
                    }
                }
            } else {
                None
            };

            Ok(LifelineResponse {
                lifeline,
                used_lifelines: session.used_lifelines,
                hidden_answers: session.hidden_on_current().to_vec(),
                vote_session,
            })
        })
        .await
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Every recorded session, newest first.
pub async fn list_sessions(state: &SharedState) -> Result<Vec<GameSessionSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    Ok(store
        .list_sessions()
        .await?
        .into_iter()
        .map(|entity| GameSessionSummary::from(&GameSession::from(entity)))
        .collect())
}

/// Delete every session, history included. Announces the end of a running game.
pub async fn clear_all_sessions(state: &SharedState) -> Result<DeletedCountResponse, ServiceError> {
    state
        .run_transition("clear_all_sessions", move || async move {
            let store = state.require_game_store().await?;
            let had_active = store.find_active_session().await?.is_some();
            let deleted_count = store.delete_all_sessions().await?;

            state.voting().clear().await;
            state.board().write().await.clear();
            if had_active {
                sse_events::broadcast_game_ended(state.hub());
            }
            warn!(deleted_count, "all game sessions deleted");

            Ok(DeletedCountResponse { deleted_count })
        })
        .await
}
