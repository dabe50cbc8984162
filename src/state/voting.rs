//! Ephemeral "ask the audience" poll. Lives in process memory only: a restart
//! silently drops any vote in flight.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};

use serde::{Deserialize, Serialize};
use tokio::{
    sync::Mutex,
    task::AbortHandle,
    time::{Instant, sleep_until},
};
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::AnswerLetter,
    dto::{
        format_system_time,
        sse::{
            EVENT_VOTING_ENDED, EVENT_VOTING_STARTED, VoteQuestion, VotingEndedEvent,
            VotingStartedEvent,
        },
        voting::{OptionStats, VoteStatsResponse},
    },
    error::ServiceError,
    state::sse::{BroadcastTarget, ClientRole, SseHub},
};

/// How long an audience vote stays open.
pub const VOTE_TIME_LIMIT: Duration = Duration::from_secs(120);

/// Why a vote session stopped accepting votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VoteEndReason {
    Manual,
    Timeout,
}

/// What a new vote session is about.
#[derive(Debug, Clone)]
pub struct VoteTarget {
    pub game_session_id: Uuid,
    pub question_index: usize,
    pub question: VoteQuestion,
    pub hidden_answers: Vec<AnswerLetter>,
}

/// One audience poll, active or just ended.
#[derive(Debug, Clone)]
pub struct VoteSession {
    pub id: Uuid,
    pub game_session_id: Uuid,
    pub question_index: usize,
    pub question: VoteQuestion,
    pub hidden_answers: Vec<AnswerLetter>,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    pub time_limit: Duration,
    pub is_active: bool,
    deadline: Instant,
}

/// A single voter's current choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vote {
    pub option: AnswerLetter,
    pub timestamp: SystemTime,
}

#[derive(Default)]
struct VotingInner {
    session: Option<VoteSession>,
    votes: HashMap<String, Vote>,
    timer: Option<AbortHandle>,
}

impl VotingInner {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Single-writer owner of the audience poll.
///
/// Every operation takes the same lock, so a manual end, the expiry timer and a
/// clear can interleave but never act on the same session twice.
#[derive(Clone)]
pub struct VotingManager {
    inner: Arc<Mutex<VotingInner>>,
    hub: SseHub,
    time_limit: Duration,
}

impl VotingManager {
    /// Manager with the regular 120 second window.
    pub fn new(hub: SseHub) -> Self {
        Self::with_time_limit(hub, VOTE_TIME_LIMIT)
    }

    /// Manager whose polls last `time_limit`.
    pub fn with_time_limit(hub: SseHub, time_limit: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VotingInner::default())),
            hub,
            time_limit,
        }
    }

    /// Open a poll on `target`, schedule its expiry and announce it.
    pub async fn start(&self, target: VoteTarget) -> Result<VoteSession, ServiceError> {
        let mut inner = self.inner.lock().await;
        if inner.session.as_ref().is_some_and(|session| session.is_active) {
            return Err(ServiceError::PreconditionFailed(
                "an audience vote is already running".into(),
            ));
        }

        let start_time = SystemTime::now();
        let deadline = Instant::now() + self.time_limit;
        let session = VoteSession {
            id: Uuid::new_v4(),
            game_session_id: target.game_session_id,
            question_index: target.question_index,
            question: target.question,
            hidden_answers: target.hidden_answers,
            start_time,
            end_time: start_time + self.time_limit,
            time_limit: self.time_limit,
            is_active: true,
            deadline,
        };

        inner.cancel_timer();
        inner.votes.clear();
        inner.session = Some(session.clone());

        let manager = self.clone();
        let session_id = session.id;
        let timer = tokio::spawn(async move {
            sleep_until(deadline).await;
            manager.expire(session_id).await;
        });
        inner.timer = Some(timer.abort_handle());

        self.announce_start(&session);
        info!(vote_session_id = %session.id, question_index = session.question_index, "audience vote started");
        Ok(session)
    }

    /// Record `option` for `voter_id`, replacing any earlier vote.
    pub async fn submit_vote(&self, voter_id: &str, option: AnswerLetter) -> Result<Vote, ServiceError> {
        let voter_id = voter_id.trim();
        if voter_id.is_empty() {
            return Err(ServiceError::InvalidInput("voter id must not be empty".into()));
        }

        let mut inner = self.inner.lock().await;
        let Some(session) = inner.session.as_ref() else {
            return Err(ServiceError::NotFound("no audience vote is running".into()));
        };
        // Checked here as well as by the timer: a vote can land after the
        // deadline but before the expiry task gets the lock.
        if !session.is_active || Instant::now() >= session.deadline {
            return Err(ServiceError::PreconditionFailed(
                "the audience vote is closed".into(),
            ));
        }

        let vote = Vote {
            option,
            timestamp: SystemTime::now(),
        };
        inner.votes.insert(voter_id.to_string(), vote);
        debug!(voter_id, %option, "vote recorded");
        Ok(vote)
    }

    /// Current tally. Zeroed, never an error, when there is no session.
    pub async fn stats(&self) -> VoteStatsResponse {
        let inner = self.inner.lock().await;
        let total = inner.votes.len();
        let options = AnswerLetter::ALL
            .into_iter()
            .map(|option| {
                let count = inner
                    .votes
                    .values()
                    .filter(|vote| vote.option == option)
                    .count();
                OptionStats {
                    option,
                    count,
                    percentage: percentage(count, total),
                }
            })
            .collect();

        VoteStatsResponse {
            vote_session_id: inner.session.as_ref().map(|session| session.id),
            is_active: inner.session.as_ref().is_some_and(|session| session.is_active),
            total_votes: total,
            options,
        }
    }

    /// The current or last vote session, if one has not been cleared.
    pub async fn current(&self) -> Option<VoteSession> {
        self.inner.lock().await.session.clone()
    }

    /// Whether a poll is open. A poll past its deadline stays open until the
    /// expiry task or a manual end closes it.
    pub async fn is_active(&self) -> bool {
        self.inner
            .lock()
            .await
            .session
            .as_ref()
            .is_some_and(|session| session.is_active)
    }

    /// The vote `voter_id` holds in the current session.
    pub async fn vote_of(&self, voter_id: &str) -> Option<Vote> {
        self.inner.lock().await.votes.get(voter_id.trim()).copied()
    }

    /// Close the active poll. Fails when nothing is running.
    pub async fn end(&self, reason: VoteEndReason) -> Result<VoteSession, ServiceError> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let total_votes = inner.votes.len();
        let Some(session) = inner.session.as_mut().filter(|session| session.is_active) else {
            return Err(ServiceError::InvalidInput(
                "no active audience vote to end".into(),
            ));
        };
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        Ok(self.close(session, total_votes, reason))
    }

    /// Drop the session and every vote regardless of state. Emits nothing.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.cancel_timer();
        if let Some(session) = inner.session.take() {
            debug!(vote_session_id = %session.id, "audience vote cleared");
        }
        inner.votes.clear();
    }

    /// Timer callback. Only acts if `session_id` is still the active session.
    async fn expire(&self, session_id: Uuid) {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        let total_votes = inner.votes.len();
        let Some(session) = inner
            .session
            .as_mut()
            .filter(|session| session.id == session_id && session.is_active)
        else {
            debug!(vote_session_id = %session_id, "ignoring stale vote expiry");
            return;
        };
        // This task is the timer; dropping the handle is enough.
        inner.timer = None;
        self.close(session, total_votes, VoteEndReason::Timeout);
    }

    fn close(&self, session: &mut VoteSession, total_votes: usize, reason: VoteEndReason) -> VoteSession {
        session.is_active = false;
        session.end_time = SystemTime::now();

        let payload = VotingEndedEvent {
            vote_session_id: session.id,
            end_time: format_system_time(session.end_time),
            total_votes,
            reason,
        };
        let delivered = self
            .hub
            .broadcast(EVENT_VOTING_ENDED, &payload, BroadcastTarget::All);
        info!(vote_session_id = %session.id, ?reason, total_votes, delivered, "audience vote ended");
        session.clone()
    }

    fn announce_start(&self, session: &VoteSession) {
        let mut payload = VotingStartedEvent {
            vote_session_id: session.id,
            question_id: session.question.id,
            question: Some(session.question.clone()),
            time_limit: session.time_limit.as_secs(),
            hidden_answers: session.hidden_answers.clone(),
            start_time: format_system_time(session.start_time),
            end_time: format_system_time(session.end_time),
        };
        self.hub.broadcast(
            EVENT_VOTING_STARTED,
            &payload,
            BroadcastTarget::Role(ClientRole::Voter),
        );

        payload.question = None;
        for role in [ClientRole::Admin, ClientRole::Player] {
            self.hub
                .broadcast(EVENT_VOTING_STARTED, &payload, BroadcastTarget::Role(role));
        }
    }
}

fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (count as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::dao::models::AnswerSet;

    fn target() -> VoteTarget {
        VoteTarget {
            game_session_id: Uuid::new_v4(),
            question_index: 2,
            question: VoteQuestion {
                id: Uuid::new_v4(),
                content: "Capital of Italy?".into(),
                answers: AnswerSet {
                    a: "Paris".into(),
                    b: "Rome".into(),
                    c: "Berlin".into(),
                    d: "Madrid".into(),
                },
            },
            hidden_answers: Vec::new(),
        }
    }

    #[test]
    fn percentages_round_independently() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
    }

    #[tokio::test]
    async fn stats_without_session_are_zeroed() {
        let manager = VotingManager::new(SseHub::new());
        let stats = manager.stats().await;
        assert_eq!(stats.total_votes, 0);
        assert!(!stats.is_active);
        assert_eq!(stats.options.len(), 4);
        assert!(stats.options.iter().all(|o| o.count == 0 && o.percentage == 0));
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_active() {
        let manager = VotingManager::new(SseHub::new());
        manager.start(target()).await.unwrap();
        let err = manager.start(target()).await.unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionFailed(_)));
    }

    #[tokio::test]
    async fn last_vote_wins() {
        let manager = VotingManager::new(SseHub::new());
        manager.start(target()).await.unwrap();
        manager.submit_vote("v1", AnswerLetter::A).await.unwrap();
        manager.submit_vote("v1", AnswerLetter::C).await.unwrap();
        manager.submit_vote("v2", AnswerLetter::C).await.unwrap();

        let stats = manager.stats().await;
        assert_eq!(stats.total_votes, 2);
        assert_eq!(stats.count(AnswerLetter::A), 0);
        assert_eq!(stats.count(AnswerLetter::C), 2);
        assert_eq!(manager.vote_of("v1").await.unwrap().option, AnswerLetter::C);
    }

    #[tokio::test]
    async fn ending_twice_fails_the_second_time() {
        let manager = VotingManager::new(SseHub::new());
        manager.start(target()).await.unwrap();
        let ended = manager.end(VoteEndReason::Manual).await.unwrap();
        assert!(!ended.is_active);
        assert!(manager.end(VoteEndReason::Manual).await.is_err());
        assert!(manager.submit_vote("late", AnswerLetter::B).await.is_err());
    }

    #[tokio::test]
    async fn vote_past_the_deadline_is_refused_before_the_timer_fires() {
        let hub = SseHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.register("admin", ClientRole::Admin, tx);
        let manager = VotingManager::with_time_limit(hub, Duration::ZERO);
        manager.start(target()).await.unwrap();

        // The expiry task has not been polled yet, the session is still open.
        let err = manager.submit_vote("late", AnswerLetter::B).await.unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionFailed(_)));
        assert!(manager.is_active().await);
        assert_eq!(manager.stats().await.total_votes, 0);

        while manager.is_active().await {
            tokio::task::yield_now().await;
        }
        let mut ended = None;
        while let Ok(event) = rx.try_recv() {
            if event.event == EVENT_VOTING_ENDED {
                ended = Some(serde_json::from_str::<serde_json::Value>(&event.data).unwrap());
            }
        }
        let ended = ended.unwrap();
        assert_eq!(ended["data"]["reason"], "timeout");
        assert_eq!(ended["data"]["totalVotes"], 0);
    }

    #[tokio::test]
    async fn voters_get_the_question_and_admins_do_not() {
        let hub = SseHub::new();
        let (voter_tx, mut voter_rx) = mpsc::unbounded_channel();
        let (admin_tx, mut admin_rx) = mpsc::unbounded_channel();
        hub.register("voter", ClientRole::Voter, voter_tx);
        hub.register("admin", ClientRole::Admin, admin_tx);
        voter_rx.try_recv().unwrap();
        admin_rx.try_recv().unwrap();

        let manager = VotingManager::new(hub);
        manager.start(target()).await.unwrap();

        let voter: serde_json::Value =
            serde_json::from_str(&voter_rx.try_recv().unwrap().data).unwrap();
        let admin: serde_json::Value =
            serde_json::from_str(&admin_rx.try_recv().unwrap().data).unwrap();
        assert_eq!(voter["data"]["question"]["content"], "Capital of Italy?");
        assert!(admin["data"].get("question").is_none());
        assert_eq!(admin["data"]["timeLimit"], 120);
    }

    #[tokio::test]
    async fn clear_forgets_session_and_votes_without_events() {
        let hub = SseHub::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.register("player", ClientRole::Player, tx);

        let manager = VotingManager::new(hub);
        manager.start(target()).await.unwrap();
        manager.submit_vote("v1", AnswerLetter::B).await.unwrap();
        while rx.try_recv().is_ok() {}

        manager.clear().await;

        assert!(manager.current().await.is_none());
        assert_eq!(manager.stats().await.total_votes, 0);
        assert!(rx.try_recv().is_err());
    }
}
