// src/models/question.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

/// Question kinds. Only `multiple_choice` and `enumeration` are graded automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Enumeration,
    Essay,
    Coding,
    Listening,
    Viewing,
}

impl QuestionType {
    pub fn is_auto_graded(self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::Enumeration)
    }
}

/// A question embedded in an exam, including its grading key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Mapped from 'type' since `type` is a reserved keyword in Rust.
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    pub points: f64,

    /// The text shown to the student.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,

    /// Choices for multiple choice questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    /// Audio/video source for listening and viewing questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,

    /// Grading key for multiple choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<Value>,

    /// Grading key for enumeration (compared as a set).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answers: Option<Vec<String>>,

    /// Any other prompt data supplied by the author, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// DTO for sending a question to a student (excludes the grading key).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub points: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        Self {
            question_type: q.question_type,
            points: q.points,
            prompt: q.prompt.clone(),
            options: q.options.clone(),
            media_url: q.media_url.clone(),
            extra: q.extra.clone(),
        }
    }
}

/// Validates an exam's question list: every question carries the grading key
/// its type needs, points are non-negative and media URLs parse.
pub fn validate_questions(questions: &[Question]) -> Result<(), validator::ValidationError> {
    for q in questions {
        if !q.points.is_finite() || q.points < 0.0 {
            return Err(validator::ValidationError::new("invalid_points"));
        }
        match q.question_type {
            QuestionType::MultipleChoice => {
                if q.correct_answer.as_ref().is_none_or(Value::is_null) {
                    return Err(validator::ValidationError::new("missing_correct_answer"));
                }
            }
            QuestionType::Enumeration => {
                if q.correct_answers.as_ref().is_none_or(Vec::is_empty) {
                    return Err(validator::ValidationError::new("missing_correct_answers"));
                }
            }
            _ => {}
        }
        if let Some(url) = &q.media_url {
            if url.len() > 500 || Url::parse(url).is_err() {
                return Err(validator::ValidationError::new("invalid_media_url"));
            }
        }
    }
    Ok(())
}

/// Checker for the stored `questions` column: the list must deserialize and
/// pass `validate_questions`.
pub fn check_questions(value: &Value) -> Result<(), String> {
    let questions = Vec::<Question>::deserialize(value).map_err(|e| e.to_string())?;
    validate_questions(&questions).map_err(|e| e.code.to_string())
}
