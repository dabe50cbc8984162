//! Per-role projections of the game.
//!
//! The stream is a hint and the pull endpoint is the truth: events patch the
//! local view where the payload allows it, and every event that touches game
//! or vote state also asks the driver for a reconciliation fetch.

use std::time::SystemTime;

use tracing::debug;

use crate::{
    client::{answer::AnswerPhase, countdown::Countdown, events::StreamEvent},
    dao::models::{AnswerLetter, SessionStatus},
    dto::{
        game::GameSessionSummary,
        parse_system_time,
        public::{AnswerRevealView, GameStateResponse, QuestionView},
        voting::{VoteResponse, VoteSessionSummary, VoteStatsResponse},
    },
    state::ClientRole,
};

/// Everything one reconciliation fetch returns.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub game: GameStateResponse,
    /// Fetched by roles that display the tally.
    pub voting_stats: Option<VoteStatsResponse>,
    /// The voter's own ballot, voter role only.
    pub my_vote: Option<VoteResponse>,
}

/// What the driver should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Nothing,
    Reconcile,
}

/// A role's local state, fed by snapshots, events and the 1 Hz tick.
pub trait Projection: Clone + Send + Sync + 'static {
    fn role(&self) -> ClientRole;

    /// Shared part of the state every role keeps.
    fn view(&self) -> &GameView;

    /// Merge an authoritative snapshot. Returns `false` when it was older than the held state.
    fn apply_snapshot(&mut self, snapshot: StateSnapshot) -> bool;

    fn apply_event(&mut self, event: &StreamEvent) -> Reaction;

    /// Advance local countdowns by one second.
    fn tick(&mut self);

    fn set_connected(&mut self, connected: bool);
}

/// State shared by all three roles.
#[derive(Debug, Clone, Default)]
pub struct GameView {
    pub session: Option<GameSessionSummary>,
    pub question: Option<QuestionView>,
    pub selected_answer: Option<AnswerLetter>,
    pub reveal: Option<AnswerRevealView>,
    pub voting: Option<VoteSessionSummary>,
    pub question_time_limit: u32,
    pub degraded: bool,
    pub connected: bool,
    pub question_countdown: Countdown,
    pub vote_countdown: Countdown,
}

impl GameView {
    /// Where the current question stands, derived from the held state.
    pub fn answer_phase(&self) -> AnswerPhase {
        AnswerPhase::derive(
            self.session.as_ref(),
            self.selected_answer,
            self.reveal.as_ref(),
        )
    }

    /// A game is running.
    pub fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.status == SessionStatus::Active)
    }

    /// An audience vote is open.
    pub fn is_voting(&self) -> bool {
        self.voting.as_ref().is_some_and(|vote| vote.is_active)
    }

    fn position(&self) -> Option<(uuid::Uuid, usize)> {
        self.session
            .as_ref()
            .map(|session| (session.id, session.current_question_index))
    }

    fn merge(&mut self, game: GameStateResponse) -> bool {
        if let (Some(held), Some(incoming)) = (&self.session, &game.session) {
            if held.id == incoming.id && incoming.version < held.version {
                debug!(held = held.version, incoming = incoming.version, "ignoring stale snapshot");
                return false;
            }
        }

        let previous_position = self.position();
        let previous_vote = self.voting.as_ref().map(|vote| (vote.id, vote.is_active));

        self.session = game.session;
        self.question = game.question;
        self.selected_answer = game.selected_answer;
        self.reveal = game.reveal;
        self.voting = game.voting;
        self.question_time_limit = game.question_time_limit;
        self.degraded = game.degraded;

        if self.position() != previous_position {
            self.reseed_question_countdown();
        }
        if !self.is_active() || self.reveal.is_some() {
            self.question_countdown.stop();
        }

        let current_vote = self.voting.as_ref().map(|vote| (vote.id, vote.is_active));
        if current_vote != previous_vote {
            match self.voting.as_ref().filter(|vote| vote.is_active) {
                Some(vote) => match parse_system_time(&vote.end_time) {
                    Some(end) => self.vote_countdown.seed_until(end, SystemTime::now()),
                    None => self.vote_countdown.seed(vote.time_limit),
                },
                None => self.vote_countdown.stop(),
            }
        }
        true
    }

    fn reseed_question_countdown(&mut self) {
        if self.is_active() {
            self.question_countdown
                .seed(u64::from(self.question_time_limit));
        } else {
            self.question_countdown.stop();
        }
    }

    /// Patch the view from an event. Always asks for reconciliation except for the greeting.
    fn on_event(&mut self, event: &StreamEvent) -> Reaction {
        match event {
            StreamEvent::ConnectionEstablished(_) => return Reaction::Nothing,
            StreamEvent::QuestionChanged(changed) => {
                if let Some(limit) = changed.question_time_limit {
                    self.question_time_limit = limit;
                }
                if let Some(session) = self.session.as_mut() {
                    session.current_question_index = changed.question_index;
                    session.total_questions = changed.total_questions;
                    if let Some(status) = changed.status {
                        session.status = status;
                    }
                }
                self.selected_answer = None;
                self.reveal = None;
                self.reseed_question_countdown();
            }
            StreamEvent::AnswerSelected(selected) => {
                if self.is_on(selected.question_index) {
                    self.selected_answer = Some(selected.selected_answer);
                }
            }
            StreamEvent::AnswerRevealed(revealed) => {
                if self.is_on(revealed.question_index) {
                    self.selected_answer = Some(revealed.selected_answer);
                    self.reveal = Some(AnswerRevealView {
                        selected_answer: revealed.selected_answer,
                        correct_answer: revealed.correct_answer,
                        is_correct: revealed.is_correct,
                        game_won: revealed.game_won,
                    });
                    if let Some(question) = self.question.as_mut() {
                        question.correct_answer = Some(revealed.correct_answer);
                    }
                    self.question_countdown.stop();
                }
            }
            StreamEvent::LifelineUsed(used) => {
                if let Some(session) = self.session.as_mut() {
                    session.used_lifelines = used.used_lifelines;
                }
            }
            StreamEvent::VotingStarted(started) => {
                match parse_system_time(&started.end_time) {
                    Some(end) => self.vote_countdown.seed_until(end, SystemTime::now()),
                    None => self.vote_countdown.seed(started.time_limit),
                }
            }
            StreamEvent::VotingEnded(ended) => {
                if let Some(vote) = self
                    .voting
                    .as_mut()
                    .filter(|vote| vote.id == ended.vote_session_id)
                {
                    vote.is_active = false;
                    vote.end_time = ended.end_time.clone();
                }
                self.vote_countdown.stop();
            }
            StreamEvent::GameEnded(_) => {
                if let Some(session) = self.session.as_mut() {
                    session.status = SessionStatus::Finished;
                }
                self.question_countdown.stop();
                self.vote_countdown.stop();
            }
            StreamEvent::Unknown(name) => debug!(event = %name, "unknown event; reconciling"),
        }
        Reaction::Reconcile
    }

    /// Whether the view currently shows `question_index`. An unknown session
    /// counts as a mismatch so the event waits for reconciliation.
    fn is_on(&self, question_index: usize) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.current_question_index == question_index)
    }

    fn tick(&mut self) {
        self.question_countdown.tick();
        self.vote_countdown.tick();
    }
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// Host console: everything, correct answer and live tally included.
#[derive(Debug, Clone, Default)]
pub struct AdminProjection {
    pub view: GameView,
    pub stats: Option<VoteStatsResponse>,
}

impl Projection for AdminProjection {
    fn role(&self) -> ClientRole {
        ClientRole::Admin
    }

    fn view(&self) -> &GameView {
        &self.view
    }

    fn apply_snapshot(&mut self, snapshot: StateSnapshot) -> bool {
        if !self.view.merge(snapshot.game) {
            return false;
        }
        self.stats = snapshot.voting_stats;
        true
    }

    fn apply_event(&mut self, event: &StreamEvent) -> Reaction {
        if let StreamEvent::QuestionChanged(_) | StreamEvent::GameEnded(_) = event {
            self.stats = None;
        }
        self.view.on_event(event)
    }

    fn tick(&mut self) {
        self.view.tick();
    }

    fn set_connected(&mut self, connected: bool) {
        self.view.connected = connected;
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Contestant screen.
#[derive(Debug, Clone, Default)]
pub struct PlayerProjection {
    pub view: GameView,
}

impl Projection for PlayerProjection {
    fn role(&self) -> ClientRole {
        ClientRole::Player
    }

    fn view(&self) -> &GameView {
        &self.view
    }

    fn apply_snapshot(&mut self, snapshot: StateSnapshot) -> bool {
        self.view.merge(snapshot.game)
    }

    fn apply_event(&mut self, event: &StreamEvent) -> Reaction {
        self.view.on_event(event)
    }

    fn tick(&mut self) {
        self.view.tick();
    }

    fn set_connected(&mut self, connected: bool) {
        self.view.connected = connected;
    }
}

// ---------------------------------------------------------------------------
// Voter
// ---------------------------------------------------------------------------

/// Audience page: only the vote matters, answer events are ignored.
#[derive(Debug, Clone)]
pub struct VoterProjection {
    pub voter_id: String,
    pub view: GameView,
    pub my_vote: Option<AnswerLetter>,
    pub stats: Option<VoteStatsResponse>,
}

impl VoterProjection {
    /// Projection for the voter identified by `voter_id`.
    pub fn new(voter_id: impl Into<String>) -> Self {
        Self {
            voter_id: voter_id.into(),
            view: GameView::default(),
            my_vote: None,
            stats: None,
        }
    }

    /// Whether the ballot form should be enabled.
    pub fn can_vote(&self) -> bool {
        self.view.is_voting() && self.view.vote_countdown.is_running()
    }

    /// Record a ballot the server just accepted.
    pub fn record_vote(&mut self, option: AnswerLetter) {
        self.my_vote = Some(option);
    }
}

impl Projection for VoterProjection {
    fn role(&self) -> ClientRole {
        ClientRole::Voter
    }

    fn view(&self) -> &GameView {
        &self.view
    }

    fn apply_snapshot(&mut self, snapshot: StateSnapshot) -> bool {
        let previous_vote = self.view.voting.as_ref().map(|vote| vote.id);
        if !self.view.merge(snapshot.game) {
            return false;
        }
        let current_vote = self.view.voting.as_ref().map(|vote| vote.id);
        self.my_vote = match snapshot.my_vote {
            Some(ballot) => Some(ballot.option),
            None if current_vote != previous_vote => None,
            None => self.my_vote,
        };
        self.stats = snapshot.voting_stats;
        true
    }

    fn apply_event(&mut self, event: &StreamEvent) -> Reaction {
        match event {
            StreamEvent::AnswerSelected(_) | StreamEvent::AnswerRevealed(_) => Reaction::Nothing,
            StreamEvent::VotingStarted(_) | StreamEvent::QuestionChanged(_) => {
                self.my_vote = None;
                self.stats = None;
                self.view.on_event(event)
            }
            _ => self.view.on_event(event),
        }
    }

    fn tick(&mut self) {
        self.view.tick();
    }

    fn set_connected(&mut self, connected: bool) {
        self.view.connected = connected;
    }
}
