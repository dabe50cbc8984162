pub mod memory;
pub mod timed;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{GameSessionEntity, GameSessionQuestionEntity, QuestionEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;
use uuid::Uuid;

pub use memory::MemoryGameStore;
pub use timed::TimedGameStore;

/// Abstraction over the persistence layer for the question bank and game sessions.
pub trait GameStore: Send + Sync {
    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>>;
    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>>;
    /// Insert or replace a question.
    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    fn delete_questions(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<u64>>;
    fn delete_all_questions(&self) -> BoxFuture<'static, StorageResult<u64>>;

    fn find_active_session(&self) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>>;
    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>>;
    /// Every session, newest first.
    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>>;
    /// Retire every active session at `session.created_at`, then persist
    /// `session` with its ordered question associations. Returns how many
    /// sessions were retired.
    fn begin_session(
        &self,
        session: GameSessionEntity,
        questions: Vec<GameSessionQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<u64>>;
    /// Replace a session, failing with [`StorageError::Conflict`](crate::dao::storage::StorageError::Conflict)
    /// when the stored version is not `expected_version`.
    fn update_session(
        &self,
        session: GameSessionEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Associations of a session ordered by `order`.
    fn session_questions(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameSessionQuestionEntity>>>;
    fn delete_all_sessions(&self) -> BoxFuture<'static, StorageResult<u64>>;

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
