//! Client-side synchronisation for the three game screens.
//!
//! Each role keeps a [`Projection`] fed by the event stream, reconciled
//! against the pull endpoints and ticked locally once per second. The
//! [`SyncDriver`] owns the connection lifecycle; transports plug in through
//! [`StateFetcher`] and [`EventSource`].

use thiserror::Error;

pub mod answer;
pub mod countdown;
pub mod events;
#[cfg(feature = "client")]
pub mod http;
pub mod projection;
pub mod sse_decoder;
pub mod sync;

pub use answer::{AnswerPhase, SlotState};
pub use countdown::Countdown;
pub use events::StreamEvent;
#[cfg(feature = "client")]
pub use http::HttpClient;
pub use projection::{
    AdminProjection, GameView, PlayerProjection, Projection, Reaction, StateSnapshot,
    VoterProjection,
};
pub use sync::{EventSource, EventStream, StateFetcher, SyncConfig, SyncDriver};

/// Failures seen by a streaming client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the connection dropped.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("unexpected response status {status}: {body}")]
    Status { status: u16, body: String },
    /// A payload did not match the expected shape.
    #[error("failed to decode payload")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// Whether the failure ends the current stream connection.
    pub fn is_fatal_for_stream(&self) -> bool {
        !matches!(self, ClientError::Decode(_))
    }
}

#[cfg(feature = "client")]
impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ClientError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            },
            None => ClientError::Transport(err.to_string()),
        }
    }
}
