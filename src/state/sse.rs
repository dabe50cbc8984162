use std::{fmt, str::FromStr, sync::Arc, time::SystemTime};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::dto::{
    format_system_time,
    sse::{ConnectionEstablishedEvent, EVENT_CONNECTION_ESTABLISHED, ServerEvent},
};

/// Role a streaming client declared when it subscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    Admin,
    Player,
    Voter,
}

impl ClientRole {
    /// Lowercase name used on the wire and in query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientRole::Admin => "admin",
            ClientRole::Player => "player",
            ClientRole::Voter => "voter",
        }
    }
}

impl fmt::Display for ClientRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a subscriber asks for a role the hub does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown client role `{0}` (expected admin, player or voter)")]
pub struct UnknownRole(pub String);

impl FromStr for ClientRole {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(ClientRole::Admin),
            "player" => Ok(ClientRole::Player),
            "voter" => Ok(ClientRole::Voter),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Who a broadcast is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastTarget {
    All,
    Role(ClientRole),
}

impl BroadcastTarget {
    fn includes(self, role: ClientRole) -> bool {
        match self {
            BroadcastTarget::All => true,
            BroadcastTarget::Role(target) => target == role,
        }
    }
}

/// One registered streaming client.
pub struct SseClient {
    pub role: ClientRole,
    pub connected_at: SystemTime,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

/// Registry of connected streaming clients, tagged by role.
///
/// Delivery is at-most-once: a client whose channel is closed is dropped from
/// the registry during the broadcast that noticed it, and the broadcaster never
/// sees the failure. Every recipient of one broadcast gets the same serialised
/// envelope, timestamp included.
#[derive(Clone, Default)]
pub struct SseHub {
    clients: Arc<DashMap<String, SseClient>>,
}

impl SseHub {
    /// Hub with no clients.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the client and push `connection-established` to it alone.
    ///
    /// Ids are not checked for uniqueness; registering an existing id replaces it.
    pub fn register(
        &self,
        client_id: impl Into<String>,
        role: ClientRole,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) {
        let client_id = client_id.into();
        let now = SystemTime::now();
        let timestamp = format_system_time(now);
        let greeting = ConnectionEstablishedEvent {
            client_id: client_id.clone(),
            server_time: timestamp.clone(),
            message: format!("connected as {role}"),
        };

        let event = match ServerEvent::envelope(EVENT_CONNECTION_ESTABLISHED, &greeting, &timestamp)
        {
            Ok(event) => event,
            Err(err) => {
                warn!(client_id = %client_id, error = %err, "failed to serialize SSE greeting");
                return;
            }
        };

        self.clients.insert(
            client_id.clone(),
            SseClient {
                role,
                connected_at: now,
                tx: tx.clone(),
            },
        );
        debug!(client_id = %client_id, %role, "SSE client registered");

        if tx.send(event).is_err() {
            warn!(client_id = %client_id, "SSE client went away before its greeting");
            self.unregister(&client_id);
        }
    }

    /// Remove a client. Unknown ids are ignored.
    pub fn unregister(&self, client_id: &str) -> bool {
        let removed = self.clients.remove(client_id).is_some();
        if removed {
            debug!(client_id, "SSE client unregistered");
        }
        removed
    }

    /// Push `payload` as `event_type` to every client matching `target`.
    ///
    /// Returns how many clients accepted the event.
    pub fn broadcast<T: Serialize>(&self, event_type: &str, payload: &T, target: BroadcastTarget) -> usize {
        let timestamp = format_system_time(SystemTime::now());
        let event = match ServerEvent::envelope(event_type, payload, &timestamp) {
            Ok(event) => event,
            Err(err) => {
                warn!(event = event_type, error = %err, "failed to serialize SSE payload");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut broken = Vec::new();
        for entry in self.clients.iter() {
            if !target.includes(entry.role) {
                continue;
            }
            if entry.tx.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                broken.push(entry.key().clone());
            }
        }

        for client_id in broken {
            // The id may have been re-registered with a live channel meanwhile.
            if self
                .clients
                .remove_if(&client_id, |_, client| client.tx.is_closed())
                .is_some()
            {
                warn!(client_id = %client_id, event = event_type, "dropping SSE client after failed write");
            }
        }

        delivered
    }

    /// Remove `client_id` only if its channel is closed.
    ///
    /// Stream teardown uses this after dropping its receiver, so a newer
    /// registration under the same id survives.
    pub fn release(&self, client_id: &str) -> bool {
        let removed = self
            .clients
            .remove_if(client_id, |_, client| client.tx.is_closed())
            .is_some();
        if removed {
            debug!(client_id, "SSE client released");
        }
        removed
    }

    /// Number of registered clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Whether `client_id` currently holds a channel.
    pub fn is_registered(&self, client_id: &str) -> bool {
        self.clients.contains_key(client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::sse::Envelope;

    fn decode(event: ServerEvent) -> Envelope {
        serde_json::from_str(&event.data).unwrap()
    }

    #[test]
    fn register_greets_only_the_new_client() {
        let hub = SseHub::new();
        let (first_tx, mut first_rx) = mpsc::unbounded_channel();
        let (second_tx, mut second_rx) = mpsc::unbounded_channel();

        hub.register("first", ClientRole::Admin, first_tx);
        let greeting = decode(first_rx.try_recv().unwrap());
        assert_eq!(greeting.event_type, EVENT_CONNECTION_ESTABLISHED);
        assert_eq!(greeting.data["clientId"], "first");

        hub.register("second", ClientRole::Voter, second_tx);
        assert!(first_rx.try_recv().is_err());
        assert!(second_rx.try_recv().is_ok());
    }

    #[test]
    fn role_broadcast_skips_other_roles() {
        let hub = SseHub::new();
        let (admin_tx, mut admin_rx) = mpsc::unbounded_channel();
        let (voter_tx, mut voter_rx) = mpsc::unbounded_channel();
        hub.register("admin", ClientRole::Admin, admin_tx);
        hub.register("voter", ClientRole::Voter, voter_tx);
        admin_rx.try_recv().unwrap();
        voter_rx.try_recv().unwrap();

        let delivered = hub.broadcast(
            "voting-started",
            &serde_json::json!({"x": 1}),
            BroadcastTarget::Role(ClientRole::Voter),
        );

        assert_eq!(delivered, 1);
        assert!(admin_rx.try_recv().is_err());
        assert_eq!(decode(voter_rx.try_recv().unwrap()).data["x"], 1);
    }

    #[test]
    fn closed_clients_are_dropped_on_broadcast() {
        let hub = SseHub::new();
        let (tx, rx) = mpsc::unbounded_channel();
        hub.register("gone", ClientRole::Player, tx);
        drop(rx);

        let delivered = hub.broadcast("game-ended", &serde_json::json!({}), BroadcastTarget::All);

        assert_eq!(delivered, 0);
        assert!(!hub.is_registered("gone"));
    }

    #[test]
    fn unregister_is_idempotent() {
        let hub = SseHub::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        hub.register("once", ClientRole::Voter, tx);
        assert!(hub.unregister("once"));
        assert!(!hub.unregister("once"));
        assert_eq!(hub.broadcast("x", &1, BroadcastTarget::All), 0);
    }

    #[test]
    fn release_keeps_a_live_replacement() {
        let hub = SseHub::new();
        let (old_tx, old_rx) = mpsc::unbounded_channel();
        hub.register("tab", ClientRole::Admin, old_tx);
        let (new_tx, _new_rx) = mpsc::unbounded_channel();
        hub.register("tab", ClientRole::Admin, new_tx);

        drop(old_rx);
        assert!(!hub.release("tab"));
        assert!(hub.is_registered("tab"));
    }

    #[test]
    fn all_recipients_share_one_timestamp() {
        let hub = SseHub::new();
        let mut receivers = Vec::new();
        for id in ["a", "b", "c"] {
            let (tx, mut rx) = mpsc::unbounded_channel();
            hub.register(id, ClientRole::Player, tx);
            rx.try_recv().unwrap();
            receivers.push(rx);
        }

        hub.broadcast("question-changed", &serde_json::json!({}), BroadcastTarget::All);

        let stamps: Vec<String> = receivers
            .iter_mut()
            .map(|rx| decode(rx.try_recv().unwrap()).timestamp)
            .collect();
        assert!(stamps.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
