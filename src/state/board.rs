use uuid::Uuid;

use crate::{dao::models::AnswerLetter, dto::public::AnswerRevealView};

/// Presentation state of the question on screen: what the host highlighted and
/// whether the answer was locked in. Not persisted; reset whenever the
/// question changes so reconnecting clients rebuild the same view.
#[derive(Debug, Clone, Default)]
pub struct AnswerBoard {
    position: Option<(Uuid, usize)>,
    selected: Option<AnswerLetter>,
    reveal: Option<AnswerRevealView>,
}

impl AnswerBoard {
    /// Point the board at a fresh question with nothing selected.
    pub fn reset(&mut self, session_id: Uuid, question_index: usize) {
        *self = Self {
            position: Some((session_id, question_index)),
            ..Self::default()
        };
    }

    /// Forget selection and reveal.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Highlight `answer` on the given question.
    pub fn select(&mut self, session_id: Uuid, question_index: usize, answer: AnswerLetter) {
        self.align(session_id, question_index);
        self.selected = Some(answer);
    }

    /// Record the resolved answer, which also becomes the selection.
    pub fn reveal(&mut self, session_id: Uuid, question_index: usize, reveal: AnswerRevealView) {
        self.align(session_id, question_index);
        self.selected = Some(reveal.selected_answer);
        self.reveal = Some(reveal);
    }

    /// Selection and reveal for the given question, empty if the board shows another one.
    pub fn view(
        &self,
        session_id: Uuid,
        question_index: usize,
    ) -> (Option<AnswerLetter>, Option<AnswerRevealView>) {
        if self.position == Some((session_id, question_index)) {
            (self.selected, self.reveal)
        } else {
            (None, None)
        }
    }

    fn align(&mut self, session_id: Uuid, question_index: usize) {
        if self.position != Some((session_id, question_index)) {
            self.reset(session_id, question_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_is_scoped_to_the_current_question() {
        let session = Uuid::new_v4();
        let mut board = AnswerBoard::default();
        board.select(session, 0, AnswerLetter::B);

        assert_eq!(board.view(session, 0).0, Some(AnswerLetter::B));
        assert_eq!(board.view(session, 1), (None, None));

        board.reset(session, 1);
        assert_eq!(board.view(session, 0), (None, None));
    }

    #[test]
    fn reveal_overrides_the_selection() {
        let session = Uuid::new_v4();
        let mut board = AnswerBoard::default();
        board.select(session, 3, AnswerLetter::A);
        board.reveal(
            session,
            3,
            AnswerRevealView {
                selected_answer: AnswerLetter::D,
                correct_answer: AnswerLetter::D,
                is_correct: true,
                game_won: false,
            },
        );

        let (selected, reveal) = board.view(session, 3);
        assert_eq!(selected, Some(AnswerLetter::D));
        assert!(reveal.unwrap().is_correct);
    }
}
