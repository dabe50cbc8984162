//! HTTP transport for the sync driver, built on `reqwest`.

use std::{sync::Arc, time::Duration};

use futures::{StreamExt, future::BoxFuture};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    client::{
        ClientError,
        events::StreamEvent,
        projection::StateSnapshot,
        sse_decoder::SseDecoder,
        sync::{EventSource, EventStream, StateFetcher},
    },
    dao::models::AnswerLetter,
    dto::{
        public::GameStateResponse,
        voting::{VoteResponse, VoteStatsResponse},
    },
    state::ClientRole,
};

/// Bound on establishing a TCP connection, stream included.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Bound on a whole pull request. The event stream is long-lived and only
/// gets [`CONNECT_TIMEOUT`].
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Talks to one game server on behalf of one role.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    base_url: Arc<str>,
    role: ClientRole,
    client_id: Arc<str>,
    voter_id: Option<Arc<str>>,
}

impl HttpClient {
    /// Build a client for `role` against the server at `base_url`.
    pub fn new(base_url: &str, role: ClientRole, client_id: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().connect_timeout(CONNECT_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            role,
            client_id: Arc::from(client_id.into()),
            voter_id: None,
        })
    }

    /// Identify the voter whose ballot is fetched with each snapshot.
    pub fn with_voter(mut self, voter_id: impl Into<String>) -> Self {
        self.voter_id = Some(Arc::from(voter_id.into()));
        self
    }

    /// Role this client streams and fetches as.
    pub fn role(&self) -> ClientRole {
        self.role
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
    }

    fn pull(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.request(method, path).timeout(REQUEST_TIMEOUT)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.pull(Method::GET, path).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Like [`Self::get_json`] but a 404 reads as `None`.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ClientError> {
        let response = self.pull(Method::GET, path).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(response).await?;
        Ok(Some(response.json().await?))
    }

    /// Cast or change this client's ballot.
    pub async fn vote(&self, option: AnswerLetter) -> Result<VoteResponse, ClientError> {
        let voter_id = self.voter_id.as_deref().unwrap_or(&*self.client_id);
        let response = self
            .pull(Method::POST, "/voting/vote")
            .json(&serde_json::json!({ "voterId": voter_id, "option": option }))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn snapshot(&self) -> Result<StateSnapshot, ClientError> {
        let snapshot = match self.role {
            ClientRole::Admin => StateSnapshot {
                game: self.get_json::<GameStateResponse>("/admin/state").await?,
                voting_stats: Some(self.get_json::<VoteStatsResponse>("/voting/stats").await?),
                my_vote: None,
            },
            ClientRole::Player => StateSnapshot {
                game: self.get_json("/public/state").await?,
                voting_stats: None,
                my_vote: None,
            },
            ClientRole::Voter => {
                let my_vote = match self.voter_id.as_deref() {
                    Some(voter_id) => {
                        self.get_optional::<VoteResponse>(&format!("/voting/votes/{voter_id}"))
                            .await?
                    }
                    None => None,
                };
                StateSnapshot {
                    game: self.get_json("/public/state").await?,
                    voting_stats: Some(self.get_json("/voting/stats").await?),
                    my_vote,
                }
            }
        };
        Ok(snapshot)
    }

    async fn open_stream(&self) -> Result<EventStream, ClientError> {
        let response = self
            .request(Method::GET, "/sse")
            .query(&[("role", self.role.as_str()), ("clientId", &*self.client_id)])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        debug!(role = %self.role, client_id = %self.client_id, "stream opened");

        let mut bytes = Box::pin(response.bytes_stream());
        let events = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for frame in decoder.push(&chunk) {
                            yield StreamEvent::parse(&frame.data);
                        }
                    }
                    Err(err) => {
                        yield Err(ClientError::from(err));
                        break;
                    }
                }
            }
        };
        Ok(events.boxed())
    }
}

impl StateFetcher for HttpClient {
    fn fetch(&self) -> BoxFuture<'_, Result<StateSnapshot, ClientError>> {
        Box::pin(self.snapshot())
    }
}

impl EventSource for HttpClient {
    fn connect(&self) -> BoxFuture<'_, Result<EventStream, ClientError>> {
        Box::pin(self.open_stream())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        status: status.as_u16(),
        body,
    })
}
