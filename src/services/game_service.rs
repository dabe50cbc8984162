//! Question selection and lookups shared by the admin, voting and public services.

use std::sync::Arc;

use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::{
    dao::{game_store::GameStore, models::QuestionEntity},
    error::ServiceError,
    state::state_machine::{GameSession, QUESTIONS_PER_GAME},
};

/// Draw the questions of a new game: a full shuffle of the bank, first twelve kept.
pub fn sample_questions<R: Rng + ?Sized>(
    mut bank: Vec<QuestionEntity>,
    rng: &mut R,
) -> Result<Vec<QuestionEntity>, ServiceError> {
    if bank.len() < QUESTIONS_PER_GAME {
        return Err(ServiceError::PreconditionFailed(format!(
            "a game needs at least {QUESTIONS_PER_GAME} questions, the bank has {}",
            bank.len()
        )));
    }
    bank.shuffle(rng);
    bank.truncate(QUESTIONS_PER_GAME);
    Ok(bank)
}

/// Resolve the question at `index` through the session's associations.
pub async fn question_at(
    store: &Arc<dyn GameStore>,
    session_id: Uuid,
    index: usize,
) -> Result<QuestionEntity, ServiceError> {
    let associations = store.session_questions(session_id).await?;
    let Some(association) = associations.iter().find(|link| link.order == index) else {
        return Err(ServiceError::NotFound(format!(
            "session `{session_id}` has no question at index {index}"
        )));
    };

    store
        .find_question(association.question_id)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "question `{}` no longer exists in the bank",
                association.question_id
            ))
        })
}

/// The question the session currently points at.
pub async fn current_question(
    store: &Arc<dyn GameStore>,
    session: &GameSession,
) -> Result<QuestionEntity, ServiceError> {
    question_at(store, session.id, session.current_question_index).await
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, time::SystemTime};

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::dao::models::{AnswerLetter, AnswerSet};

    fn bank(size: usize) -> Vec<QuestionEntity> {
        (0..size)
            .map(|n| QuestionEntity {
                id: Uuid::new_v4(),
                content: format!("question {n}"),
                answers: AnswerSet {
                    a: "a".into(),
                    b: "b".into(),
                    c: "c".into(),
                    d: "d".into(),
                },
                correct_answer: AnswerLetter::A,
                created_at: SystemTime::now(),
                updated_at: SystemTime::now(),
            })
            .collect()
    }

    #[test]
    fn small_bank_is_refused() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = sample_questions(bank(11), &mut rng).unwrap_err();
        assert!(matches!(err, ServiceError::PreconditionFailed(_)));
    }

    #[test]
    fn sample_takes_twelve_distinct_questions_from_a_larger_bank() {
        let mut rng = StdRng::seed_from_u64(7);
        let source = bank(40);
        let picked = sample_questions(source.clone(), &mut rng).unwrap();

        assert_eq!(picked.len(), QUESTIONS_PER_GAME);
        let ids: HashSet<Uuid> = picked.iter().map(|q| q.id).collect();
        assert_eq!(ids.len(), QUESTIONS_PER_GAME);
        let known: HashSet<Uuid> = source.iter().map(|q| q.id).collect();
        assert!(ids.is_subset(&known));
    }

    #[test]
    fn different_draws_pick_different_subsets() {
        let source = bank(40);
        let first = sample_questions(source.clone(), &mut StdRng::seed_from_u64(1)).unwrap();
        let second = sample_questions(source, &mut StdRng::seed_from_u64(2)).unwrap();
        let first: Vec<Uuid> = first.iter().map(|q| q.id).collect();
        let second: Vec<Uuid> = second.iter().map(|q| q.id).collect();
        assert_ne!(first, second);
    }
}
