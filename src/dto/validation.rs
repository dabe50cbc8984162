//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::{
    dao::models::{AnswerLetter, AnswerSet},
    state::state_machine::Lifeline,
};

/// Validates that an answer is exactly one of `A`, `B`, `C` or `D`.
///
/// # Examples
///
/// ```ignore
/// validate_answer_letter("B")  // Ok
/// validate_answer_letter("b")  // Err - lowercase
/// validate_answer_letter("AB") // Err
/// ```
pub fn validate_answer_letter(value: &str) -> Result<(), ValidationError> {
    value.parse::<AnswerLetter>().map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("answer_letter");
        error.message = Some(err.to_string().into());
        error
    })
}

/// Validates that a lifeline identifier is one of the three known kinds.
pub fn validate_lifeline(value: &str) -> Result<(), ValidationError> {
    value.parse::<Lifeline>().map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("lifeline");
        error.message = Some(err.to_string().into());
        error
    })
}

/// Validates that none of the four answer texts is blank.
pub fn validate_answer_texts(answers: &AnswerSet) -> Result<(), ValidationError> {
    if let Some(letter) = AnswerLetter::ALL
        .into_iter()
        .find(|letter| answers.get(*letter).trim().is_empty())
    {
        let mut err = ValidationError::new("answer_text_blank");
        err.message = Some(format!("answer {letter} must not be blank").into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_answer_letter() {
        assert!(validate_answer_letter("A").is_ok());
        assert!(validate_answer_letter("D").is_ok());
        assert!(validate_answer_letter("E").is_err());
        assert!(validate_answer_letter("a").is_err()); // lowercase
        assert!(validate_answer_letter("").is_err());
    }

    #[test]
    fn test_validate_lifeline() {
        assert!(validate_lifeline("fiftyFifty").is_ok());
        assert!(validate_lifeline("phoneAFriend").is_ok());
        assert!(validate_lifeline("askTheHost").is_err());
    }

    #[test]
    fn test_validate_answer_texts() {
        let mut answers = AnswerSet {
            a: "Paris".into(),
            b: "Rome".into(),
            c: "Berlin".into(),
            d: "Madrid".into(),
        };
        assert!(validate_answer_texts(&answers).is_ok());

        answers.c = "   ".into();
        let err = validate_answer_texts(&answers).unwrap_err();
        assert_eq!(err.code, "answer_text_blank");
    }
}
