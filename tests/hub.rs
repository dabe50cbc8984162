mod common;

use millionaire_back::{
    dto::sse::{EVENT_CONNECTION_ESTABLISHED, EVENT_QUESTION_CHANGED},
    services::admin_service,
    state::{BroadcastTarget, ClientRole},
};

use common::{Listener, state_with_bank};

#[tokio::test]
async fn every_client_is_greeted_on_its_own() {
    let (state, _store) = state_with_bank(12);
    let mut first = Listener::attach(&state, "player-1", ClientRole::Player);
    let mut second = Listener::attach(&state, "voter-1", ClientRole::Voter);

    let greeting = first.named(EVENT_CONNECTION_ESTABLISHED);
    assert_eq!(greeting.len(), 1);
    assert_eq!(greeting[0]["clientId"], "player-1");
    assert_eq!(second.named(EVENT_CONNECTION_ESTABLISHED).len(), 1);
    assert!(first.drain().is_empty());
}

#[tokio::test]
async fn game_events_reach_every_role_with_the_same_envelope() {
    let (state, _store) = state_with_bank(12);
    let mut listeners = [
        Listener::attach(&state, "admin-1", ClientRole::Admin),
        Listener::attach(&state, "player-1", ClientRole::Player),
        Listener::attach(&state, "voter-1", ClientRole::Voter),
    ];

    admin_service::start_game(&state).await.unwrap();

    let payloads: Vec<_> = listeners
        .iter_mut()
        .map(|listener| listener.named(EVENT_QUESTION_CHANGED))
        .collect();
    for payload in &payloads {
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0], payloads[0][0]);
        assert_eq!(payload[0]["questionIndex"], 0);
        assert_eq!(payload[0]["totalQuestions"], 12);
    }
}

#[tokio::test]
async fn role_targeted_broadcasts_skip_other_roles() {
    let (state, _store) = state_with_bank(12);
    let mut admin = Listener::attach(&state, "admin-1", ClientRole::Admin);
    let mut voter = Listener::attach(&state, "voter-1", ClientRole::Voter);
    admin.drain();
    voter.drain();

    let delivered = state.hub().broadcast(
        "note",
        &serde_json::json!({ "text": "admins only" }),
        BroadcastTarget::Role(ClientRole::Admin),
    );

    assert_eq!(delivered, 1);
    assert_eq!(admin.named("note").len(), 1);
    assert!(voter.drain().is_empty());
}

#[tokio::test]
async fn closed_clients_are_dropped_on_the_next_broadcast() {
    let (state, _store) = state_with_bank(12);
    let gone = Listener::attach(&state, "player-1", ClientRole::Player);
    let mut staying = Listener::attach(&state, "player-2", ClientRole::Player);
    drop(gone);
    staying.drain();

    let delivered = state
        .hub()
        .broadcast("note", &serde_json::json!({}), BroadcastTarget::All);

    assert_eq!(delivered, 1);
    assert!(!state.hub().is_registered("player-1"));
    assert_eq!(state.hub().client_count(), 1);
}

#[tokio::test]
async fn unregistered_clients_receive_nothing() {
    let (state, _store) = state_with_bank(12);
    let mut listener = Listener::attach(&state, "voter-1", ClientRole::Voter);
    assert!(state.hub().unregister("voter-1"));
    assert!(!state.hub().unregister("voter-1"));
    listener.drain();

    let delivered = state
        .hub()
        .broadcast("note", &serde_json::json!({}), BroadcastTarget::Role(ClientRole::Voter));

    assert_eq!(delivered, 0);
    assert!(listener.drain().is_empty());
}
