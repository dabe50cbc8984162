use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save question `{id}`")]
    SaveQuestion {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load questions")]
    LoadQuestions {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete questions")]
    DeleteQuestions {
        #[source]
        source: MongoError,
    },
    #[error("failed to save game session `{id}`")]
    SaveSession {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load game sessions")]
    LoadSessions {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete game sessions")]
    DeleteSessions {
        #[source]
        source: MongoError,
    },
    #[error("stored document `{id}` has a malformed identifier")]
    CorruptDocument {
        id: String,
        #[source]
        source: uuid::Error,
    },
}
