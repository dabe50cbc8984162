use std::{
    convert::Infallible,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;
use uuid::Uuid;

use crate::{
    dto::sse::{ServerEvent, SubscribeQuery},
    error::ServiceError,
    state::{ClientRole, SharedState, sse::UnknownRole},
};

/// Register a streaming client on the hub and return the response streaming its events.
///
/// The hub writes into an unbounded channel; a forwarder task moves events
/// into the response and releases the registration once the client goes away.
pub fn subscribe(
    state: &SharedState,
    query: SubscribeQuery,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, ServiceError> {
    let role: ClientRole = query
        .role
        .parse()
        .map_err(|err: UnknownRole| ServiceError::InvalidInput(err.to_string()))?;
    let client_id = query
        .client_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| generate_client_id(role));

    let (hub_tx, mut hub_rx) = mpsc::unbounded_channel::<ServerEvent>();
    state.hub().register(client_id.clone(), role, hub_tx);
    info!(client_id = %client_id, %role, "SSE stream connected");

    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(16);
    let hub = state.hub().clone();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                next = hub_rx.recv() => {
                    let Some(payload) = next else { break };
                    let event = Event::default().event(payload.event).data(payload.data);
                    if tx.send(Ok(event)).await.is_err() {
                        break;
                    }
                }
            }
        }

        drop(hub_rx);
        hub.release(&client_id);
        info!(client_id = %client_id, %role, "SSE stream disconnected");
    });

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(state.config().sse_keep_alive())
            .text("keep-alive"),
    ))
}

/// `{role}-{unix millis}-{8 hex chars}`.
fn generate_client_id(role: ClientRole) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{role}-{millis}-{}", &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_the_role() {
        let id = generate_client_id(ClientRole::Voter);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts[0], "voter");
        assert!(parts[1].parse::<u128>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert_ne!(id, generate_client_id(ClientRole::Voter));
    }
}
