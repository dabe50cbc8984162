//! Answer lifecycle derived from a projection, never tracked as separate flags.

use crate::{
    dao::models::{AnswerLetter, SessionStatus},
    dto::{
        game::GameSessionSummary,
        public::{AnswerRevealView, QuestionView},
    },
};

/// Where the current question stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerPhase {
    /// No session known yet.
    NoGame,
    /// Question on screen, nothing highlighted.
    Thinking,
    /// The host highlighted a letter but has not locked it in.
    Selected(AnswerLetter),
    Revealed {
        selected: AnswerLetter,
        correct: AnswerLetter,
        is_correct: bool,
        game_won: bool,
    },
    /// The session is finished and nothing was revealed on its last question.
    GameOver,
}

impl AnswerPhase {
    /// Phase of the current question from the session, selection and reveal.
    pub fn derive(
        session: Option<&GameSessionSummary>,
        selected: Option<AnswerLetter>,
        reveal: Option<&AnswerRevealView>,
    ) -> Self {
        let Some(session) = session else {
            return AnswerPhase::NoGame;
        };
        if let Some(reveal) = reveal {
            return AnswerPhase::Revealed {
                selected: reveal.selected_answer,
                correct: reveal.correct_answer,
                is_correct: reveal.is_correct,
                game_won: reveal.game_won,
            };
        }
        if session.status != SessionStatus::Active {
            return AnswerPhase::GameOver;
        }
        match selected {
            Some(letter) => AnswerPhase::Selected(letter),
            None => AnswerPhase::Thinking,
        }
    }

    /// Whether the host may still pick or lock in an answer.
    pub fn accepts_answer(self) -> bool {
        matches!(self, AnswerPhase::Thinking | AnswerPhase::Selected(_))
    }
}

/// How one answer slot is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Available,
    /// Removed by fifty-fifty.
    Hidden,
    Selected,
    Correct,
    Wrong,
}

/// Display state of the four slots for `phase`.
///
/// `question` supplies the fifty-fifty letters and, on the admin console, the
/// correct answer before the reveal.
pub fn slot_states(phase: AnswerPhase, question: Option<&QuestionView>) -> [(AnswerLetter, SlotState); 4] {
    let hidden = question.map(|q| q.hidden_answers.as_slice()).unwrap_or_default();
    AnswerLetter::ALL.map(|letter| {
        let state = match phase {
            AnswerPhase::Revealed {
                selected, correct, ..
            } => {
                if letter == correct {
                    SlotState::Correct
                } else if letter == selected {
                    SlotState::Wrong
                } else if hidden.contains(&letter) {
                    SlotState::Hidden
                } else {
                    SlotState::Available
                }
            }
            _ if hidden.contains(&letter) => SlotState::Hidden,
            AnswerPhase::Selected(selected) if selected == letter => SlotState::Selected,
            _ => SlotState::Available,
        };
        (letter, state)
    })
}
