mod common;

use millionaire_back::{
    dao::{game_store::GameStore, models::SessionStatus},
    dto::{
        admin::{AnswerRequest, GameTimeRequest, LifelineRequest},
        sse::{EVENT_ANSWER_REVEALED, EVENT_GAME_ENDED, EVENT_QUESTION_CHANGED},
    },
    error::ServiceError,
    services::{
        admin_service,
        public_service::{self, SnapshotAudience},
    },
    state::ClientRole,
};

use common::{CORRECT, Listener, WRONG, state_with_bank};

fn answer(letter: &str) -> AnswerRequest {
    AnswerRequest {
        answer: letter.into(),
    }
}

fn lifeline(name: &str) -> LifelineRequest {
    LifelineRequest {
        lifeline: name.into(),
    }
}

#[tokio::test]
async fn correct_answer_keeps_the_game_running_until_next() {
    let (state, store) = state_with_bank(12);
    let mut player = Listener::attach(&state, "player-1", ClientRole::Player);

    let started = admin_service::start_game(&state).await.unwrap();
    assert_eq!(started.session.status, SessionStatus::Active);
    assert_eq!(started.session.current_question_index, 0);
    assert_eq!(started.question_ids.len(), 12);
    assert!(!started.session.used_lifelines.fifty_fifty);
    assert!(!started.session.used_lifelines.phone_a_friend);
    assert!(!started.session.used_lifelines.ask_audience);
    let associations = store.session_questions(started.session.id).await.unwrap();
    assert_eq!(associations.len(), 12);

    let result = admin_service::submit_answer(&state, answer(CORRECT)).await.unwrap();
    assert!(result.is_correct);
    assert!(!result.game_won);
    assert_eq!(result.status, SessionStatus::Active);

    let revealed = player.named(EVENT_ANSWER_REVEALED);
    assert_eq!(revealed.len(), 1);
    assert_eq!(revealed[0]["isCorrect"], true);
    assert_eq!(revealed[0]["gameWon"], false);

    let session = admin_service::next_question(&state).await.unwrap();
    assert_eq!(session.current_question_index, 1);
    let changed = player.named(EVENT_QUESTION_CHANGED);
    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0]["questionIndex"], 1);
}

#[tokio::test]
async fn correct_answer_on_the_last_question_wins() {
    let (state, _store) = state_with_bank(15);
    admin_service::start_game(&state).await.unwrap();
    for _ in 0..11 {
        admin_service::next_question(&state).await.unwrap();
    }

    let result = admin_service::submit_answer(&state, answer(CORRECT)).await.unwrap();
    assert!(result.game_won);
    assert_eq!(result.question_index, 11);
    assert_eq!(result.status, SessionStatus::Finished);

    let err = admin_service::next_question(&state).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn next_on_the_last_question_of_a_running_game_is_not_found() {
    let (state, _store) = state_with_bank(12);
    admin_service::start_game(&state).await.unwrap();
    for _ in 0..11 {
        admin_service::next_question(&state).await.unwrap();
    }

    let err = admin_service::next_question(&state).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    let snapshot = public_service::game_state(&state, SnapshotAudience::Public)
        .await
        .unwrap();
    let session = snapshot.session.unwrap();
    assert_eq!(session.current_question_index, 11);
    assert_eq!(session.status, SessionStatus::Active);
}

#[tokio::test]
async fn wrong_answer_ends_the_game_and_reveals_the_right_one() {
    let (state, _store) = state_with_bank(12);
    admin_service::start_game(&state).await.unwrap();
    admin_service::next_question(&state).await.unwrap();

    let result = admin_service::submit_answer(&state, answer(WRONG)).await.unwrap();
    assert!(!result.is_correct);
    assert!(!result.game_won);
    assert_eq!(result.status, SessionStatus::Finished);

    // The finished game is still what screens show.
    let snapshot = public_service::game_state(&state, SnapshotAudience::Public)
        .await
        .unwrap();
    assert_eq!(snapshot.session.unwrap().status, SessionStatus::Finished);
    let reveal = snapshot.reveal.unwrap();
    assert_eq!(reveal.selected_answer.as_str(), WRONG);
    assert_eq!(reveal.correct_answer.as_str(), CORRECT);
    assert_eq!(
        snapshot.question.unwrap().correct_answer.map(|letter| letter.as_str()),
        Some(CORRECT)
    );

    let err = admin_service::submit_answer(&state, answer(CORRECT)).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn public_snapshot_hides_the_answer_until_reveal() {
    let (state, _store) = state_with_bank(12);
    admin_service::start_game(&state).await.unwrap();
    admin_service::select_answer(&state, answer("C")).await.unwrap();

    let public = public_service::game_state(&state, SnapshotAudience::Public)
        .await
        .unwrap();
    assert_eq!(public.question.as_ref().unwrap().correct_answer, None);
    assert_eq!(public.selected_answer.map(|letter| letter.as_str()), Some("C"));

    let admin = public_service::game_state(&state, SnapshotAudience::Admin)
        .await
        .unwrap();
    assert_eq!(
        admin.question.unwrap().correct_answer.map(|letter| letter.as_str()),
        Some(CORRECT)
    );
}

#[tokio::test]
async fn starting_needs_twelve_questions() {
    let (state, store) = state_with_bank(11);

    let err = admin_service::start_game(&state).await.unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));
    assert!(store.list_sessions().await.unwrap().is_empty());
}

#[tokio::test]
async fn only_one_session_is_ever_active() {
    let (state, store) = state_with_bank(20);
    let first = admin_service::start_game(&state).await.unwrap();
    let second = admin_service::start_game(&state).await.unwrap();

    let sessions = store.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 2);
    let active: Vec<_> = sessions
        .iter()
        .filter(|session| session.status == SessionStatus::Active)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second.session.id);

    let first = store.find_session(first.session.id).await.unwrap().unwrap();
    assert_eq!(first.status, SessionStatus::Finished);
}

#[tokio::test]
async fn a_lifeline_is_single_use() {
    let (state, _store) = state_with_bank(12);
    admin_service::start_game(&state).await.unwrap();

    let used = admin_service::use_lifeline(&state, lifeline("fiftyFifty")).await.unwrap();
    assert!(used.used_lifelines.fifty_fifty);
    assert_eq!(used.hidden_answers.len(), 2);
    assert!(!used.hidden_answers.iter().any(|letter| letter.as_str() == CORRECT));

    let err = admin_service::use_lifeline(&state, lifeline("fiftyFifty"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PreconditionFailed(_)));

    let err = admin_service::use_lifeline(&state, lifeline("doubleDip"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));

    // The hidden letters belong to the question they were used on.
    admin_service::next_question(&state).await.unwrap();
    let snapshot = public_service::game_state(&state, SnapshotAudience::Public)
        .await
        .unwrap();
    assert!(snapshot.question.unwrap().hidden_answers.is_empty());
}

#[tokio::test]
async fn previous_clamps_at_the_first_question() {
    let (state, _store) = state_with_bank(12);
    admin_service::start_game(&state).await.unwrap();
    admin_service::next_question(&state).await.unwrap();

    let session = admin_service::previous_question(&state).await.unwrap();
    assert_eq!(session.current_question_index, 0);
    let session = admin_service::previous_question(&state).await.unwrap();
    assert_eq!(session.current_question_index, 0);
}

#[tokio::test]
async fn game_time_rejects_negative_values() {
    let (state, _store) = state_with_bank(12);
    admin_service::start_game(&state).await.unwrap();

    let session = admin_service::update_game_time(&state, GameTimeRequest { seconds: 95 })
        .await
        .unwrap();
    assert_eq!(session.game_time, 95);

    let err = admin_service::update_game_time(&state, GameTimeRequest { seconds: -1 })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidInput(_)));
}

#[tokio::test]
async fn transitions_without_a_game_are_not_found() {
    let (state, _store) = state_with_bank(12);

    assert!(matches!(
        admin_service::next_question(&state).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    assert!(matches!(
        admin_service::select_answer(&state, answer("A")).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
    assert!(matches!(
        admin_service::stop_game(&state).await.unwrap_err(),
        ServiceError::NotFound(_)
    ));
}

#[tokio::test]
async fn stop_ends_the_game_for_every_screen() {
    let (state, _store) = state_with_bank(12);
    admin_service::start_game(&state).await.unwrap();
    let mut voter = Listener::attach(&state, "voter-1", ClientRole::Voter);

    let session = admin_service::stop_game(&state).await.unwrap();
    assert_eq!(session.status, SessionStatus::Finished);
    assert_eq!(voter.named(EVENT_GAME_ENDED).len(), 1);
}

#[tokio::test]
async fn clearing_history_removes_every_session() {
    let (state, store) = state_with_bank(12);
    for _ in 0..3 {
        admin_service::start_game(&state).await.unwrap();
    }
    let mut admin = Listener::attach(&state, "admin-1", ClientRole::Admin);

    let deleted = admin_service::clear_all_sessions(&state).await.unwrap();
    assert_eq!(deleted.deleted_count, 3);
    assert!(admin_service::list_sessions(&state).await.unwrap().is_empty());
    assert!(store.find_active_session().await.unwrap().is_none());
    assert_eq!(admin.named(EVENT_GAME_ENDED).len(), 1);
}
