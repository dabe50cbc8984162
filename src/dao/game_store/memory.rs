//! Process-local [`GameStore`] used when no database is configured and by tests.

use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{GameSessionEntity, GameSessionQuestionEntity, QuestionEntity, SessionStatus},
    storage::{StorageError, StorageResult},
};

/// In-memory store. Cloning shares the underlying data.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    questions: IndexMap<Uuid, QuestionEntity>,
    sessions: IndexMap<Uuid, GameSessionEntity>,
    session_questions: HashMap<Uuid, Vec<GameSessionQuestionEntity>>,
}

impl MemoryGameStore {
    /// Build an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-filled with `questions`.
    pub fn with_questions(questions: impl IntoIterator<Item = QuestionEntity>) -> Self {
        let inner = MemoryInner {
            questions: questions.into_iter().map(|q| (q.id, q)).collect(),
            ..MemoryInner::default()
        };
        Self {
            inner: Arc::new(RwLock::new(inner)),
        }
    }
}

impl GameStore for MemoryGameStore {
    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.questions.values().cloned().collect()) })
    }

    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.questions.get(&id).cloned()) })
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            inner.write().await.questions.insert(question.id, question);
            Ok(())
        })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.write().await.questions.shift_remove(&id).is_some()) })
    }

    fn delete_questions(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let deleted = ids
                .iter()
                .filter(|id| guard.questions.shift_remove(*id).is_some())
                .count();
            Ok(deleted as u64)
        })
    }

    fn delete_all_questions(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let deleted = guard.questions.len() as u64;
            guard.questions.clear();
            Ok(deleted)
        })
    }

    fn find_active_session(&self) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .sessions
                .values()
                .find(|session| session.status == SessionStatus::Active)
                .cloned())
        })
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.sessions.get(&id).cloned()) })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut sessions: Vec<_> = inner.read().await.sessions.values().cloned().collect();
            sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(sessions)
        })
    }

    fn begin_session(
        &self,
        session: GameSessionEntity,
        questions: Vec<GameSessionQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let at = session.created_at;
            let mut retired = 0;
            for active in guard
                .sessions
                .values_mut()
                .filter(|stored| stored.status == SessionStatus::Active)
            {
                active.status = SessionStatus::Finished;
                active.end_time = Some(at);
                active.updated_at = at;
                active.version += 1;
                retired += 1;
            }

            let mut questions = questions;
            questions.sort_by_key(|association| association.order);
            guard.session_questions.insert(session.id, questions);
            guard.sessions.insert(session.id, session);
            Ok(retired)
        })
    }

    fn update_session(
        &self,
        session: GameSessionEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let conflict = StorageError::Conflict {
                id: session.id,
                expected: expected_version,
            };
            match guard.sessions.get_mut(&session.id) {
                Some(stored) if stored.version == expected_version => {
                    *stored = session;
                    Ok(())
                }
                _ => Err(conflict),
            }
        })
    }

    fn session_questions(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameSessionQuestionEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            Ok(inner
                .read()
                .await
                .session_questions
                .get(&session_id)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn delete_all_sessions(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let mut guard = inner.write().await;
            let deleted = guard.sessions.len() as u64;
            guard.sessions.clear();
            guard.session_questions.clear();
            Ok(deleted)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::UsedLifelines;

    fn session(status: SessionStatus) -> GameSessionEntity {
        let now = SystemTime::now();
        GameSessionEntity {
            id: Uuid::new_v4(),
            status,
            current_question_index: 0,
            total_questions: 12,
            used_lifelines: UsedLifelines::default(),
            hidden_answers: Vec::new(),
            audience_vote_questions: Vec::new(),
            game_time: 0,
            start_time: Some(now),
            end_time: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = MemoryGameStore::new();
        let mut stored = session(SessionStatus::Active);
        store.begin_session(stored.clone(), Vec::new()).await.unwrap();

        stored.version = 1;
        store.update_session(stored.clone(), 0).await.unwrap();

        let err = store.update_session(stored, 0).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { expected: 0, .. }));
    }

    #[tokio::test]
    async fn beginning_a_session_retires_only_the_active_one() {
        let store = MemoryGameStore::new();
        let finished = session(SessionStatus::Finished);
        let active = session(SessionStatus::Active);
        let next = session(SessionStatus::Active);
        assert_eq!(store.begin_session(finished.clone(), Vec::new()).await.unwrap(), 0);
        assert_eq!(store.begin_session(active.clone(), Vec::new()).await.unwrap(), 0);

        let retired = store.begin_session(next.clone(), Vec::new()).await.unwrap();
        assert_eq!(retired, 1);

        let reloaded = store.find_session(active.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, SessionStatus::Finished);
        assert_eq!(reloaded.end_time, Some(next.created_at));
        assert_eq!(reloaded.version, 1);
        let untouched = store.find_session(finished.id).await.unwrap().unwrap();
        assert_eq!(untouched.version, 0);
        let current = store.find_active_session().await.unwrap().unwrap();
        assert_eq!(current.id, next.id);
    }
}
