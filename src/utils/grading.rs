// src/utils/grading.rs

//! Positional auto-grading of exam submissions.
//!
//! Answer `i` is graded against question `i`. Only multiple choice and
//! enumeration questions are scored here; every other type is left with a
//! `None` score for manual grading.

use std::collections::HashSet;

use serde_json::Value;

use crate::{
    error::AppError,
    models::{
        question::{Question, QuestionType},
        submission::{Answer, SubmittedAnswer},
    },
};

/// Scored answers of one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingOutcome {
    pub answers: Vec<Answer>,
    /// Sum of all awarded points.
    pub score: f64,
    /// True when no answer awaits manual grading.
    pub graded: bool,
}

impl GradingOutcome {
    /// Score persisted on the submission: the sum once fully graded, 0 otherwise.
    pub fn stored_score(&self) -> f64 {
        if self.graded { self.score } else { 0.0 }
    }
}

/// Scores a single answer. `None` means the question needs a human grader.
pub fn grade_answer(question: &Question, answer: &Value) -> Option<f64> {
    if !question.question_type.is_auto_graded() {
        return None;
    }

    let correct = if question.question_type == QuestionType::MultipleChoice {
        question.correct_answer.as_ref().is_some_and(|key| key == answer)
    } else {
        let expected = question
            .correct_answers
            .as_deref()
            .map(|keys| keys.iter().map(|key| normalize(key)).collect::<HashSet<_>>());
        // Any non-string item invalidates the whole answer.
        let given = answer.as_array().and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(normalize))
                .collect::<Option<HashSet<_>>>()
        });
        matches!((expected, given), (Some(e), Some(g)) if e == g)
    };

    Some(if correct { question.points } else { 0.0 })
}

fn normalize(item: &str) -> String {
    item.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(value: Value) -> Question {
        serde_json::from_value(value).unwrap()
    }

    fn answers(values: Vec<Value>) -> Vec<SubmittedAnswer> {
        values
            .into_iter()
            .map(|answer| SubmittedAnswer { answer })
            .collect()
    }

    #[test]
    fn test_multiple_choice_correct() {
        let qs = [question(json!({
            "type": "multiple_choice",
            "points": 10,
            "correct_answer": "B"
        }))];

        let outcome = grade_submission(&qs, answers(vec![json!("B")])).unwrap();
        assert!(outcome.graded);
        assert_eq!(outcome.score, 10.0);
        assert_eq!(outcome.stored_score(), 10.0);
        assert_eq!(outcome.answers[0].score, Some(10.0));
    }

    #[test]
    fn test_multiple_choice_wrong() {
        let qs = [question(json!({
            "type": "multiple_choice",
            "points": 10,
            "correct_answer": "B"
        }))];

        let outcome = grade_submission(&qs, answers(vec![json!("C")])).unwrap();
        assert!(outcome.graded);
        assert_eq!(outcome.score, 0.0);
        assert_eq!(outcome.answers[0].score, Some(0.0));
    }

    #[test]
    fn test_enumeration_ignores_case_whitespace_and_order() {
        let q = question(json!({
            "type": "enumeration",
            "points": 4,
            "correct_answers": ["Paris", "london"]
        }));

        assert_eq!(grade_answer(&q, &json!(["london ", "PARIS"])), Some(4.0));
        assert_eq!(grade_answer(&q, &json!(["london"])), Some(0.0));
        assert_eq!(grade_answer(&q, &json!(["london", "paris", "rome"])), Some(0.0));
        assert_eq!(grade_answer(&q, &json!("london, paris")), Some(0.0));
    }

    #[test]
    fn test_enumeration_with_non_string_items_scores_zero() {
        let q = question(json!({
            "type": "enumeration",
            "points": 4,
            "correct_answers": ["Paris"]
        }));

        assert_eq!(grade_answer(&q, &json!(["paris", 42, null])), Some(0.0));
        assert_eq!(grade_answer(&q, &json!(["paris", ["paris"]])), Some(0.0));
        assert_eq!(grade_answer(&q, &json!(["paris"])), Some(4.0));
    }

    #[test]
    fn test_only_objective_types_are_auto_graded() {
        let essay = question(json!({"type": "essay", "points": 10, "correct_answer": "anything"}));
        assert!(!essay.question_type.is_auto_graded());
        assert_eq!(grade_answer(&essay, &json!("anything")), None);
    }

    #[test]
    fn test_subjective_question_blocks_full_grading() {
        let qs = [
            question(json!({"type": "multiple_choice", "points": 5, "correct_answer": "A"})),
            question(json!({"type": "essay", "points": 15})),
        ];

        let outcome =
            grade_submission(&qs, answers(vec![json!("A"), json!("My essay")])).unwrap();
        assert!(!outcome.graded);
        assert_eq!(outcome.score, 5.0);
        assert_eq!(outcome.stored_score(), 0.0);
        assert_eq!(outcome.answers[0].score, Some(5.0));
        assert_eq!(outcome.answers[1].score, None);
    }

    #[test]
    fn test_missing_answers_are_unanswered() {
        let qs = [
            question(json!({"type": "multiple_choice", "points": 5, "correct_answer": "A"})),
            question(json!({"type": "enumeration", "points": 5, "correct_answers": ["x"]})),
        ];

        let outcome = grade_submission(&qs, answers(vec![json!("A")])).unwrap();
        assert_eq!(outcome.answers.len(), 2);
        assert_eq!(outcome.answers[1].answer, Value::Null);
        assert_eq!(outcome.answers[1].score, Some(0.0));
        assert!(outcome.graded);
        assert_eq!(outcome.score, 5.0);
    }

    #[test]
    fn test_too_many_answers_rejected() {
        let qs = [question(json!({"type": "essay", "points": 1}))];
        let result = grade_submission(&qs, answers(vec![json!("a"), json!("b")]));
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_empty_exam_is_trivially_graded() {
        let outcome = grade_submission(&[], Vec::new()).unwrap();
        assert!(outcome.graded);
        assert_eq!(outcome.score, 0.0);
    }
}
