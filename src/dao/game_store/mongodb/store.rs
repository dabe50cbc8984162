use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoQuestionDocument, MongoSessionDocument, MongoSessionQuestionDocument, doc_id,
        to_millis,
    },
};
use crate::dao::{
    game_store::GameStore,
    models::{GameSessionEntity, GameSessionQuestionEntity, QuestionEntity},
    storage::{StorageError, StorageResult},
};

const QUESTION_COLLECTION_NAME: &str = "questions";
const SESSION_COLLECTION_NAME: &str = "game_sessions";
const SESSION_QUESTION_COLLECTION_NAME: &str = "game_session_questions";

#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    #[allow(dead_code)]
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.state.read().await.database.clone();

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let association_index = IndexModel::builder()
            .keys(doc! {"game_session_id": 1, "order": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("session_question_order_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        self.session_question_collection()
            .await
            .create_index(association_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SESSION_QUESTION_COLLECTION_NAME,
                index: "game_session_id,order",
                source,
            })?;

        let status_index = IndexModel::builder()
            .keys(doc! {"status": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("session_status_idx".to_owned()))
                    .build(),
            )
            .build();

        self.session_collection()
            .await
            .create_index(status_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SESSION_COLLECTION_NAME,
                index: "status",
                source,
            })?;

        Ok(())
    }

    async fn question_collection(&self) -> Collection<MongoQuestionDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoQuestionDocument>(QUESTION_COLLECTION_NAME)
    }

    async fn session_collection(&self) -> Collection<MongoSessionDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoSessionDocument>(SESSION_COLLECTION_NAME)
    }

    async fn session_question_collection(&self) -> Collection<MongoSessionQuestionDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoSessionQuestionDocument>(SESSION_QUESTION_COLLECTION_NAME)
    }

    async fn list_questions(&self) -> MongoResult<Vec<QuestionEntity>> {
        let documents: Vec<MongoQuestionDocument> = self
            .question_collection()
            .await
            .find(doc! {})
            .sort(doc! {"created_at_ms": 1})
            .await
            .map_err(|source| MongoDaoError::LoadQuestions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadQuestions { source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn find_question(&self, id: Uuid) -> MongoResult<Option<QuestionEntity>> {
        self.question_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadQuestions { source })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn save_question(&self, question: QuestionEntity) -> MongoResult<()> {
        let id = question.id;
        let document: MongoQuestionDocument = question.into();
        self.question_collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveQuestion { id, source })?;
        Ok(())
    }

    async fn delete_questions_matching(&self, filter: mongodb::bson::Document) -> MongoResult<u64> {
        let result = self
            .question_collection()
            .await
            .delete_many(filter)
            .await
            .map_err(|source| MongoDaoError::DeleteQuestions { source })?;
        Ok(result.deleted_count)
    }

    async fn find_session_matching(
        &self,
        filter: mongodb::bson::Document,
    ) -> MongoResult<Option<GameSessionEntity>> {
        self.session_collection()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::LoadSessions { source })?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn list_sessions(&self) -> MongoResult<Vec<GameSessionEntity>> {
        let documents: Vec<MongoSessionDocument> = self
            .session_collection()
            .await
            .find(doc! {})
            .sort(doc! {"created_at_ms": -1})
            .await
            .map_err(|source| MongoDaoError::LoadSessions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadSessions { source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    /// Retire the running game, then insert the new one. Without a replica
    /// set there is no multi-document transaction, so a failed insert leaves
    /// no active session rather than two.
    async fn begin_session(
        &self,
        session: GameSessionEntity,
        questions: Vec<GameSessionQuestionEntity>,
    ) -> MongoResult<u64> {
        let retired = self.finish_active_sessions(session.created_at).await?;
        self.insert_session(session, questions).await?;
        Ok(retired)
    }

    async fn insert_session(
        &self,
        session: GameSessionEntity,
        questions: Vec<GameSessionQuestionEntity>,
    ) -> MongoResult<()> {
        let id = session.id;
        let document: MongoSessionDocument = session.into();
        self.session_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveSession { id, source })?;

        if questions.is_empty() {
            return Ok(());
        }

        let associations: Vec<MongoSessionQuestionDocument> =
            questions.into_iter().map(Into::into).collect();
        self.session_question_collection()
            .await
            .insert_many(&associations)
            .await
            .map_err(|source| MongoDaoError::SaveSession { id, source })?;
        Ok(())
    }

    /// Returns `false` when no document matched the expected version.
    async fn update_session(
        &self,
        session: GameSessionEntity,
        expected_version: u64,
    ) -> MongoResult<bool> {
        let id = session.id;
        let document: MongoSessionDocument = session.into();
        let result = self
            .session_collection()
            .await
            .replace_one(
                doc! {"_id": id.to_string(), "version": expected_version as i64},
                &document,
            )
            .await
            .map_err(|source| MongoDaoError::SaveSession { id, source })?;
        Ok(result.matched_count > 0)
    }

    async fn finish_active_sessions(&self, at: SystemTime) -> MongoResult<u64> {
        let millis = to_millis(at);
        let result = self
            .session_collection()
            .await
            .update_many(
                doc! {"status": "active"},
                doc! {
                    "$set": {"status": "finished", "end_time_ms": millis, "updated_at_ms": millis},
                    "$inc": {"version": 1_i64},
                },
            )
            .await
            .map_err(|source| MongoDaoError::LoadSessions { source })?;
        Ok(result.modified_count)
    }

    async fn session_questions(&self, session_id: Uuid) -> MongoResult<Vec<GameSessionQuestionEntity>> {
        let documents: Vec<MongoSessionQuestionDocument> = self
            .session_question_collection()
            .await
            .find(doc! {"game_session_id": session_id.to_string()})
            .sort(doc! {"order": 1})
            .await
            .map_err(|source| MongoDaoError::LoadSessions { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadSessions { source })?;

        documents.into_iter().map(TryInto::try_into).collect()
    }

    async fn delete_all_sessions(&self) -> MongoResult<u64> {
        self.session_question_collection()
            .await
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::DeleteSessions { source })?;
        let result = self
            .session_collection()
            .await
            .delete_many(doc! {})
            .await
            .map_err(|source| MongoDaoError::DeleteSessions { source })?;
        Ok(result.deleted_count)
    }
}

impl GameStore for MongoGameStore {
    fn list_questions(&self) -> BoxFuture<'static, StorageResult<Vec<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_questions().await.map_err(Into::into) })
    }

    fn find_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<QuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_question(id).await.map_err(Into::into) })
    }

    fn save_question(&self, question: QuestionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_question(question).await.map_err(Into::into) })
    }

    fn delete_question(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move {
            let deleted = store.delete_questions_matching(doc_id(id)).await?;
            Ok(deleted > 0)
        })
    }

    fn delete_questions(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            let ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
            store
                .delete_questions_matching(doc! {"_id": {"$in": ids}})
                .await
                .map_err(Into::into)
        })
    }

    fn delete_all_questions(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_questions_matching(doc! {})
                .await
                .map_err(Into::into)
        })
    }

    fn find_active_session(&self) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_session_matching(doc! {"status": "active"})
                .await
                .map_err(Into::into)
        })
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_session_matching(doc_id(id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<GameSessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_sessions().await.map_err(Into::into) })
    }

    fn begin_session(
        &self,
        session: GameSessionEntity,
        questions: Vec<GameSessionQuestionEntity>,
    ) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .begin_session(session, questions)
                .await
                .map_err(Into::into)
        })
    }

    fn update_session(
        &self,
        session: GameSessionEntity,
        expected_version: u64,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = session.id;
            if store.update_session(session, expected_version).await? {
                Ok(())
            } else {
                Err(StorageError::Conflict {
                    id,
                    expected: expected_version,
                })
            }
        })
    }

    fn session_questions(
        &self,
        session_id: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<GameSessionQuestionEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.session_questions(session_id).await.map_err(Into::into) })
    }

    fn delete_all_sessions(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.delete_all_sessions().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
