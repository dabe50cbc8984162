use std::sync::Arc;

use crate::{
    dao::game_store::GameStore,
    error::ServiceError,
    state::state_machine::{GameSession, TransitionError},
};

/// Load the single active session or report that no game is running.
pub async fn load_active_session(store: &Arc<dyn GameStore>) -> Result<GameSession, ServiceError> {
    store
        .find_active_session()
        .await?
        .map(GameSession::from)
        .ok_or_else(|| ServiceError::NotFound("no active game session".into()))
}

/// Apply `apply` to a copy of the active session and persist the copy.
pub async fn mutate_active_session<F, T>(
    store: &Arc<dyn GameStore>,
    apply: F,
) -> Result<(GameSession, T), ServiceError>
where
    F: FnOnce(&mut GameSession) -> Result<T, TransitionError>,
{
    let current = load_active_session(store).await?;
    apply_and_persist(store, &current, apply).await
}

/// Apply `apply` to a copy of `current` and persist the copy.
///
/// The stored session is only replaced when `apply` succeeded and actually
/// changed it, so a refused transition leaves storage untouched. The write is
/// guarded by the version `current` was loaded with.
pub async fn apply_and_persist<F, T>(
    store: &Arc<dyn GameStore>,
    current: &GameSession,
    apply: F,
) -> Result<(GameSession, T), ServiceError>
where
    F: FnOnce(&mut GameSession) -> Result<T, TransitionError>,
{
    let mut next = current.clone();
    let outcome = apply(&mut next)?;

    if next.version != current.version {
        store.update_session(next.clone().into(), current.version).await?;
    }
    Ok((next, outcome))
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use uuid::Uuid;

    use super::*;
    use crate::dao::{game_store::MemoryGameStore, models::SessionStatus};

    async fn store_with_active() -> (Arc<dyn GameStore>, Uuid) {
        let store: Arc<dyn GameStore> = Arc::new(MemoryGameStore::new());
        let session = GameSession::start(Uuid::new_v4(), 12, SystemTime::now());
        let id = session.id;
        store.begin_session(session.into(), Vec::new()).await.unwrap();
        (store, id)
    }

    #[tokio::test]
    async fn refused_transition_leaves_storage_untouched() {
        let (store, id) = store_with_active().await;

        let err = mutate_active_session(&store, |session| {
            session.current_question_index = 11;
            session.advance(SystemTime::now())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let stored = store.find_session(id).await.unwrap().unwrap();
        assert_eq!(stored.current_question_index, 0);
        assert_eq!(stored.version, 0);
    }

    #[tokio::test]
    async fn successful_transition_is_persisted() {
        let (store, id) = store_with_active().await;

        let (session, index) = mutate_active_session(&store, |session| session.advance(SystemTime::now()))
            .await
            .unwrap();

        assert_eq!(index, 1);
        let stored = store.find_session(id).await.unwrap().unwrap();
        assert_eq!(stored.current_question_index, 1);
        assert_eq!(stored.version, session.version);
    }

    #[tokio::test]
    async fn missing_active_session_is_not_found() {
        let store: Arc<dyn GameStore> = Arc::new(MemoryGameStore::new());
        let err = load_active_session(&store).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let (store, _) = store_with_active().await;
        mutate_active_session(&store, |session| session.finish(SystemTime::now()))
            .await
            .unwrap();
        let stored = store.list_sessions().await.unwrap();
        assert_eq!(stored[0].status, SessionStatus::Finished);
        assert!(load_active_session(&store).await.is_err());
    }
}
