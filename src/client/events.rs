use serde::de::DeserializeOwned;

use crate::{
    client::ClientError,
    dto::sse::{
        AnswerRevealedEvent, AnswerSelectedEvent, ConnectionEstablishedEvent,
        EVENT_ANSWER_REVEALED, EVENT_ANSWER_SELECTED, EVENT_CONNECTION_ESTABLISHED,
        EVENT_GAME_ENDED, EVENT_LIFELINE_USED, EVENT_QUESTION_CHANGED, EVENT_VOTING_ENDED,
        EVENT_VOTING_STARTED, Envelope, GameEndedEvent, LifelineUsedEvent, QuestionChangedEvent,
        VotingEndedEvent, VotingStartedEvent,
    },
};

/// A hub event decoded on the client side.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    ConnectionEstablished(ConnectionEstablishedEvent),
    QuestionChanged(QuestionChangedEvent),
    AnswerSelected(AnswerSelectedEvent),
    AnswerRevealed(AnswerRevealedEvent),
    LifelineUsed(LifelineUsedEvent),
    VotingStarted(VotingStartedEvent),
    VotingEnded(VotingEndedEvent),
    GameEnded(GameEndedEvent),
    /// An event type this client does not know; kept so callers can still reconcile.
    Unknown(String),
}

impl StreamEvent {
    /// Decode the JSON envelope carried in an SSE `data` field.
    pub fn parse(data: &str) -> Result<Self, ClientError> {
        let envelope: Envelope = serde_json::from_str(data)?;
        Self::from_envelope(envelope)
    }

    /// Interpret an already decoded envelope by its `type`.
    pub fn from_envelope(envelope: Envelope) -> Result<Self, ClientError> {
        let Envelope {
            event_type, data, ..
        } = envelope;
        let event = match event_type.as_str() {
            EVENT_CONNECTION_ESTABLISHED => StreamEvent::ConnectionEstablished(payload(data)?),
            EVENT_QUESTION_CHANGED => StreamEvent::QuestionChanged(payload(data)?),
            EVENT_ANSWER_SELECTED => StreamEvent::AnswerSelected(payload(data)?),
            EVENT_ANSWER_REVEALED => StreamEvent::AnswerRevealed(payload(data)?),
            EVENT_LIFELINE_USED => StreamEvent::LifelineUsed(payload(data)?),
            EVENT_VOTING_STARTED => StreamEvent::VotingStarted(payload(data)?),
            EVENT_VOTING_ENDED => StreamEvent::VotingEnded(payload(data)?),
            EVENT_GAME_ENDED => StreamEvent::GameEnded(payload(data)?),
            _ => StreamEvent::Unknown(event_type),
        };
        Ok(event)
    }

    /// Wire name of the event.
    pub fn name(&self) -> &str {
        match self {
            StreamEvent::ConnectionEstablished(_) => EVENT_CONNECTION_ESTABLISHED,
            StreamEvent::QuestionChanged(_) => EVENT_QUESTION_CHANGED,
            StreamEvent::AnswerSelected(_) => EVENT_ANSWER_SELECTED,
            StreamEvent::AnswerRevealed(_) => EVENT_ANSWER_REVEALED,
            StreamEvent::LifelineUsed(_) => EVENT_LIFELINE_USED,
            StreamEvent::VotingStarted(_) => EVENT_VOTING_STARTED,
            StreamEvent::VotingEnded(_) => EVENT_VOTING_ENDED,
            StreamEvent::GameEnded(_) => EVENT_GAME_ENDED,
            StreamEvent::Unknown(name) => name,
        }
    }
}

fn payload<T: DeserializeOwned>(data: serde_json::Value) -> Result<T, ClientError> {
    Ok(serde_json::from_value(data)?)
}
