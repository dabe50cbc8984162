//! Pure game-session transitions. Nothing here touches storage or the hub:
//! services load a session, apply one of these methods to a copy, persist the
//! copy against the version they read, and only then broadcast.

use std::{collections::BTreeSet, fmt, str::FromStr, time::SystemTime};

use indexmap::IndexMap;
use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::{
    AnswerLetter, GameSessionEntity, HiddenAnswersEntity, SessionStatus, UsedLifelines,
};

/// Every game is played over exactly this many questions.
pub const QUESTIONS_PER_GAME: usize = 12;

/// The three single-use aids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Lifeline {
    FiftyFifty,
    PhoneAFriend,
    AskAudience,
}

impl Lifeline {
    /// Wire identifier (`fiftyFifty`, `phoneAFriend`, `askAudience`).
    pub fn as_str(self) -> &'static str {
        match self {
            Lifeline::FiftyFifty => "fiftyFifty",
            Lifeline::PhoneAFriend => "phoneAFriend",
            Lifeline::AskAudience => "askAudience",
        }
    }

    /// Label shown on the contestant screen.
    pub fn display_name(self) -> &'static str {
        match self {
            Lifeline::FiftyFifty => "50:50",
            Lifeline::PhoneAFriend => "Phone a Friend",
            Lifeline::AskAudience => "Ask the Audience",
        }
    }

    fn is_used(self, used: &UsedLifelines) -> bool {
        match self {
            Lifeline::FiftyFifty => used.fifty_fifty,
            Lifeline::PhoneAFriend => used.phone_a_friend,
            Lifeline::AskAudience => used.ask_audience,
        }
    }

    fn mark_used(self, used: &mut UsedLifelines) {
        match self {
            Lifeline::FiftyFifty => used.fifty_fifty = true,
            Lifeline::PhoneAFriend => used.phone_a_friend = true,
            Lifeline::AskAudience => used.ask_audience = true,
        }
    }
}

impl fmt::Display for Lifeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string does not name a lifeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a lifeline (expected fiftyFifty, phoneAFriend or askAudience)")]
pub struct InvalidLifeline(pub String);

impl FromStr for Lifeline {
    type Err = InvalidLifeline;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "fiftyFifty" => Ok(Lifeline::FiftyFifty),
            "phoneAFriend" => Ok(Lifeline::PhoneAFriend),
            "askAudience" => Ok(Lifeline::AskAudience),
            other => Err(InvalidLifeline(other.to_string())),
        }
    }
}

/// Result of resolving the contestant's final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Correct, more questions remain. Index is left untouched.
    Continue,
    /// Correct answer on the last question.
    Won,
    /// Wrong answer; the game is over.
    Lost,
}

impl AnswerOutcome {
    /// Whether the outcome ended the game.
    pub fn ends_game(self) -> bool {
        !matches!(self, AnswerOutcome::Continue)
    }
}

/// Reasons a transition is refused. The session is left untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("game session is {0:?}, not active")]
    NotActive(SessionStatus),
    #[error("already on the last question (index {index})")]
    LastQuestion { index: usize },
    #[error("lifeline {0} has already been used")]
    LifelineAlreadyUsed(Lifeline),
}

/// Authoritative state of one played game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    pub id: Uuid,
    pub status: SessionStatus,
    pub current_question_index: usize,
    pub total_questions: usize,
    pub used_lifelines: UsedLifelines,
    /// Letters hidden by fifty-fifty, keyed by question index.
    pub hidden_answers: IndexMap<usize, Vec<AnswerLetter>>,
    pub audience_vote_questions: BTreeSet<usize>,
    pub game_time: u64,
    pub start_time: Option<SystemTime>,
    pub end_time: Option<SystemTime>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub version: u64,
}

impl GameSession {
    /// Fresh active session on its first question with every lifeline available.
    pub fn start(id: Uuid, total_questions: usize, now: SystemTime) -> Self {
        Self {
            id,
            status: SessionStatus::Active,
            current_question_index: 0,
            total_questions,
            used_lifelines: UsedLifelines::default(),
            hidden_answers: IndexMap::new(),
            audience_vote_questions: BTreeSet::new(),
            game_time: 0,
            start_time: Some(now),
            end_time: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// The game is still being played.
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Index of the final question (11 for a regular game).
    pub fn last_index(&self) -> usize {
        self.total_questions.saturating_sub(1)
    }

    /// Letters hidden on the current question, empty when fifty-fifty was not used here.
    pub fn hidden_on_current(&self) -> &[AnswerLetter] {
        self.hidden_answers
            .get(&self.current_question_index)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn ensure_active(&self) -> Result<(), TransitionError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(TransitionError::NotActive(self.status))
        }
    }

    fn touch(&mut self, now: SystemTime) {
        self.updated_at = now;
        self.version += 1;
    }

    fn end(&mut self, now: SystemTime) {
        self.status = SessionStatus::Finished;
        self.end_time = Some(now);
        self.touch(now);
    }

    /// Settle the contestant's answer for the current question.
    ///
    /// A wrong answer ends the game on any index. A correct answer on the last
    /// index ends it as a win. Any other correct answer leaves the session
    /// exactly as it was so the host can show the result before advancing.
    pub fn resolve_answer(
        &mut self,
        is_correct: bool,
        now: SystemTime,
    ) -> Result<AnswerOutcome, TransitionError> {
        self.ensure_active()?;
        let outcome = if !is_correct {
            AnswerOutcome::Lost
        } else if self.current_question_index >= self.last_index() {
            AnswerOutcome::Won
        } else {
            AnswerOutcome::Continue
        };

        if outcome.ends_game() {
            self.end(now);
        }
        Ok(outcome)
    }

    /// Move to the next question, refusing to go past the last one.
    pub fn advance(&mut self, now: SystemTime) -> Result<usize, TransitionError> {
        self.ensure_active()?;
        if self.current_question_index >= self.last_index() {
            return Err(TransitionError::LastQuestion {
                index: self.current_question_index,
            });
        }
        self.current_question_index += 1;
        self.touch(now);
        Ok(self.current_question_index)
    }

    /// Step back one question, clamping at zero.
    pub fn rewind(&mut self, now: SystemTime) -> Result<usize, TransitionError> {
        self.ensure_active()?;
        self.current_question_index = self.current_question_index.saturating_sub(1);
        self.touch(now);
        Ok(self.current_question_index)
    }

    /// Consume `lifeline`. `hidden` carries the letters fifty-fifty removes from
    /// the current question and is ignored for the other lifelines.
    pub fn use_lifeline(
        &mut self,
        lifeline: Lifeline,
        hidden: Option<Vec<AnswerLetter>>,
        now: SystemTime,
    ) -> Result<(), TransitionError> {
        self.ensure_active()?;
        if lifeline.is_used(&self.used_lifelines) {
            return Err(TransitionError::LifelineAlreadyUsed(lifeline));
        }
        lifeline.mark_used(&mut self.used_lifelines);
        if let (Lifeline::FiftyFifty, Some(letters)) = (lifeline, hidden) {
            self.hidden_answers
                .insert(self.current_question_index, letters);
        }
        self.touch(now);
        Ok(())
    }

    /// Administrative end of the game without win/lose semantics.
    pub fn finish(&mut self, now: SystemTime) -> Result<(), TransitionError> {
        self.ensure_active()?;
        self.end(now);
        Ok(())
    }

    /// Record that an audience vote ran on `index`. Returns `false` when it was already recorded.
    pub fn mark_audience_vote(&mut self, index: usize, now: SystemTime) -> bool {
        let inserted = self.audience_vote_questions.insert(index);
        if inserted {
            self.touch(now);
        }
        inserted
    }

    /// Overwrite the client-reported clock.
    pub fn set_game_time(&mut self, seconds: u64, now: SystemTime) -> Result<(), TransitionError> {
        self.ensure_active()?;
        self.game_time = seconds;
        self.touch(now);
        Ok(())
    }
}

/// Pick the two wrong letters fifty-fifty removes, uniformly among the three wrong ones.
pub fn pick_hidden_answers<R: Rng + ?Sized>(correct: AnswerLetter, rng: &mut R) -> Vec<AnswerLetter> {
    let mut wrong: Vec<AnswerLetter> = AnswerLetter::ALL
        .into_iter()
        .filter(|letter| *letter != correct)
        .collect();
    wrong.shuffle(rng);
    let mut hidden: Vec<AnswerLetter> = wrong.into_iter().take(2).collect();
    hidden.sort();
    hidden
}

impl From<GameSessionEntity> for GameSession {
    fn from(value: GameSessionEntity) -> Self {
        Self {
            id: value.id,
            status: value.status,
            current_question_index: value.current_question_index,
            total_questions: value.total_questions,
            used_lifelines: value.used_lifelines,
            hidden_answers: value
                .hidden_answers
                .into_iter()
                .map(|hidden| (hidden.question_index, hidden.letters))
                .collect(),
            audience_vote_questions: value.audience_vote_questions.into_iter().collect(),
            game_time: value.game_time,
            start_time: value.start_time,
            end_time: value.end_time,
            created_at: value.created_at,
            updated_at: value.updated_at,
            version: value.version,
        }
    }
}

impl From<GameSession> for GameSessionEntity {
    fn from(value: GameSession) -> Self {
        Self {
            id: value.id,
            status: value.status,
            current_question_index: value.current_question_index,
            total_questions: value.total_questions,
            used_lifelines: value.used_lifelines,
            hidden_answers: value
                .hidden_answers
                .into_iter()
                .map(|(question_index, letters)| HiddenAnswersEntity {
                    question_index,
                    letters,
                })
                .collect(),
            audience_vote_questions: value.audience_vote_questions.into_iter().collect(),
            game_time: value.game_time,
            start_time: value.start_time,
            end_time: value.end_time,
            created_at: value.created_at,
            updated_at: value.updated_at,
            version: value.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn active() -> GameSession {
        GameSession::start(Uuid::new_v4(), QUESTIONS_PER_GAME, SystemTime::now())
    }

    fn at_index(index: usize) -> GameSession {
        let mut session = active();
        session.current_question_index = index;
        session
    }

    #[test]
    fn correct_answer_before_last_question_changes_nothing() {
        let mut session = at_index(4);
        let before = session.clone();

        let outcome = session.resolve_answer(true, SystemTime::now()).unwrap();

        assert_eq!(outcome, AnswerOutcome::Continue);
        assert_eq!(session, before);
    }

    #[test]
    fn correct_answer_on_last_question_wins() {
        let mut session = at_index(11);
        let outcome = session.resolve_answer(true, SystemTime::now()).unwrap();

        assert_eq!(outcome, AnswerOutcome::Won);
        assert_eq!(session.status, SessionStatus::Finished);
        assert!(session.end_time.is_some());
    }

    #[test]
    fn wrong_answer_loses_on_any_index() {
        for index in [0, 5, 11] {
            let mut session = at_index(index);
            let outcome = session.resolve_answer(false, SystemTime::now()).unwrap();
            assert_eq!(outcome, AnswerOutcome::Lost);
            assert_eq!(session.status, SessionStatus::Finished);
        }
    }

    #[test]
    fn last_index_check_generalises_to_shorter_games() {
        let mut session = GameSession::start(Uuid::new_v4(), 3, SystemTime::now());
        session.current_question_index = 2;
        assert_eq!(
            session.resolve_answer(true, SystemTime::now()),
            Ok(AnswerOutcome::Won)
        );
    }

    #[test]
    fn advance_stops_at_last_question() {
        let mut session = at_index(10);
        assert_eq!(session.advance(SystemTime::now()), Ok(11));

        let before = session.clone();
        assert_eq!(
            session.advance(SystemTime::now()),
            Err(TransitionError::LastQuestion { index: 11 })
        );
        assert_eq!(session, before);
    }

    #[test]
    fn rewind_clamps_at_zero() {
        let mut session = at_index(1);
        assert_eq!(session.rewind(SystemTime::now()), Ok(0));
        assert_eq!(session.rewind(SystemTime::now()), Ok(0));
    }

    #[test]
    fn lifelines_are_single_use_and_independent() {
        let mut session = active();
        session
            .use_lifeline(Lifeline::PhoneAFriend, None, SystemTime::now())
            .unwrap();
        assert_eq!(
            session.use_lifeline(Lifeline::PhoneAFriend, None, SystemTime::now()),
            Err(TransitionError::LifelineAlreadyUsed(Lifeline::PhoneAFriend))
        );
        assert!(session.used_lifelines.phone_a_friend);
        assert!(!session.used_lifelines.fifty_fifty);

        session
            .use_lifeline(Lifeline::AskAudience, None, SystemTime::now())
            .unwrap();
        assert!(session.used_lifelines.ask_audience);
    }

    #[test]
    fn fifty_fifty_stores_hidden_letters_for_current_question() {
        let mut session = at_index(3);
        session
            .use_lifeline(
                Lifeline::FiftyFifty,
                Some(vec![AnswerLetter::A, AnswerLetter::C]),
                SystemTime::now(),
            )
            .unwrap();
        assert_eq!(
            session.hidden_on_current(),
            &[AnswerLetter::A, AnswerLetter::C]
        );
        assert_eq!(session.hidden_answers.len(), 1);
    }

    #[test]
    fn finished_sessions_refuse_every_transition() {
        let mut session = active();
        session.finish(SystemTime::now()).unwrap();
        let before = session.clone();

        assert!(session.advance(SystemTime::now()).is_err());
        assert!(session.rewind(SystemTime::now()).is_err());
        assert!(session.finish(SystemTime::now()).is_err());
        assert!(session.resolve_answer(true, SystemTime::now()).is_err());
        assert!(session.set_game_time(10, SystemTime::now()).is_err());
        assert_eq!(session, before);
    }

    #[test]
    fn every_mutation_bumps_the_version() {
        let mut session = active();
        session.advance(SystemTime::now()).unwrap();
        session.set_game_time(42, SystemTime::now()).unwrap();
        assert!(session.mark_audience_vote(1, SystemTime::now()));
        assert!(!session.mark_audience_vote(1, SystemTime::now()));
        assert_eq!(session.version, 3);
    }

    #[test]
    fn hidden_answers_never_include_the_correct_letter() {
        let mut rng = StdRng::seed_from_u64(7);
        for correct in AnswerLetter::ALL {
            for _ in 0..20 {
                let hidden = pick_hidden_answers(correct, &mut rng);
                assert_eq!(hidden.len(), 2);
                assert!(!hidden.contains(&correct));
                assert_ne!(hidden[0], hidden[1]);
            }
        }
    }

    #[test]
    fn entity_round_trip_keeps_hidden_answers() {
        let mut session = at_index(2);
        session
            .use_lifeline(
                Lifeline::FiftyFifty,
                Some(vec![AnswerLetter::B, AnswerLetter::D]),
                SystemTime::now(),
            )
            .unwrap();
        let entity: GameSessionEntity = session.clone().into();
        assert_eq!(GameSession::from(entity), session);
    }

    #[test]
    fn lifeline_names_parse() {
        assert_eq!("askAudience".parse::<Lifeline>(), Ok(Lifeline::AskAudience));
        assert!("fifty_fifty".parse::<Lifeline>().is_err());
    }
}
