//! [`GameStore`] decorator bounding every backend round-trip.
//!
//! Each call is spawned before it is awaited: a call that overruns the bound
//! reports [`StorageError::TimedOut`] to the caller but still runs to its end,
//! so a multi-step write is never cut half way through.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tokio::time::timeout;
use tracing::warn;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{GameSessionEntity, GameSessionQuestionEntity, QuestionEntity},
    storage::{StorageError, StorageResult},
};

/// Wraps another store and gives each call at most `limit`.
#[derive(Clone)]
pub struct TimedGameStore {
    inner: Arc<dyn GameStore>,
    limit: Duration,
}

impl TimedGameStore {
    /// Bound every call on `inner` by `limit`.
    pub fn new(inner: Arc<dyn GameStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    fn bounded<T>(
        &self,
        operation: &'static str,
        call: BoxFuture<'static, StorageResult<T>>,
    ) -> BoxFuture<'static, StorageResult<T>>
    where
        T: Send + 'static,
    {
        let limit = self.limit;
        let handle = tokio::spawn(call);
        Box::pin(async move {
            match timeout(limit, handle).await {
                Ok(Ok(result)) => result,
                Ok(Err(join_err)) => Err(StorageError::unavailable(
                    format!("storage call `{operation}` aborted"),
                    join_err,
                )),
                Err(_) => {
                    warn!(operation, ?limit, "storage call timed out");
                    Err(StorageError::TimedOut { operation, limit })
                }
            }
        })
    }
}

impl GameStore for TimedGameStore {
    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        self.bounded("list_questions", self.inner.list_questions())
    }

    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        self.bounded("find_question", self.inner.find_question(id))
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        self.bounded("save_question", self.inner.save_question(question))
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        self.bounded("delete_question", self.inner.delete_question(id))
    }

    fn delete_questions(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<u64>> {
        self.bounded("delete_questions", self.inner.delete_questions(ids))
    }

    fn delete_all_questions(&self) -> BoxFuture<'static, StorageResult<u64>> {
        self.bounded("delete_all_questions", self.inner.delete_all_questions())
    }

    fn find_active_session(&self) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        self.bounded("find_active_session", self.inner.find_active_session())
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        self.bounded("find_session", self.inner.find_session(id))
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>> {
        self.bounded("list_sessions", self.inner.list_sessions())
    }

    fn begin_session(
        &self,
        session: GameSessionEntity,
        questions: Vec<GameSessionQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        self.bounded("begin_session", self.inner.begin_session(session, questions))
    }

    fn update_session(
        &self,
        session: GameSessionEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.bounded(
            "update_session",
            self.inner.update_session(session, expected_version),
        )
    }

    fn session_questions(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameSessionQuestionEntity>>> {
        self.bounded("session_questions", self.inner.session_questions(session_id))
    }

    fn delete_all_sessions(&self) -> BoxFuture<'static, StorageResult<u64>> {
        self.bounded("delete_all_sessions", self.inner.delete_all_sessions())
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.bounded("health_check", self.inner.health_check())
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.bounded("try_reconnect", self.inner.try_reconnect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::time::sleep;

    use super::*;
    use crate::dao::game_store::MemoryGameStore;

    fn timed() -> TimedGameStore {
        TimedGameStore::new(Arc::new(MemoryGameStore::new()), Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out_but_still_completes() {
        let store = timed();
        let landed = Arc::new(AtomicBool::new(false));
        let flag = landed.clone();
        let slow: BoxFuture<'static, StorageResult<()>> = Box::pin(async move {
            sleep(Duration::from_secs(8)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        let err = store.bounded("slow_write", slow).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::TimedOut {
                operation: "slow_write",
                ..
            }
        ));
        assert!(!landed.load(Ordering::SeqCst));

        sleep(Duration::from_secs(5)).await;
        assert!(landed.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_call_reports_timed_out() {
        let store = timed();
        let hung: BoxFuture<'static, StorageResult<u64>> = Box::pin(futures::future::pending());
        let err = store.bounded("hung", hung).await.unwrap_err();
        assert!(matches!(err, StorageError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let store = timed();
        assert!(store.list_questions().await.unwrap().is_empty());
        assert!(store.find_active_session().await.unwrap().is_none());
    }
}
