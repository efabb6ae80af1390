// src/models/submission.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, types::Json};

use crate::store::{
    Record,
    fields::{Field, FieldType, check_json},
};

/// One answer of a submission with the score it earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Student-provided value: a string for multiple choice, a list of
    /// strings for enumeration, free-form otherwise. Null when unanswered.
    #[serde(default)]
    pub answer: Value,

    /// `None` means the answer awaits manual grading.
    #[serde(default)]
    pub score: Option<f64>,
}

/// Represents the 'submissions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,

    /// Positionally aligned with the exam's questions.
    pub answers: Json<Vec<Answer>>,

    pub submitted_at: DateTime<Utc>,

    /// Provisional 0 until every answer has a score.
    pub score: Option<f64>,

    /// True only when no answer awaits manual grading.
    pub graded: bool,
}

impl Record for Submission {
    const TABLE: &'static str = "submissions";
    const LABEL: &'static str = "Submission";
    const FIELDS: &'static [Field] = &[
        Field::id(),
        Field::required("exam_id", FieldType::Integer),
        Field::required("student_id", FieldType::Integer),
        Field::optional("answers", FieldType::Json(check_json::<Vec<Answer>>)),
        Field::optional("submitted_at", FieldType::Timestamp),
        Field::optional("score", FieldType::Real),
        Field::optional("graded", FieldType::Bool),
    ];
}

/// A single answer as sent by the student.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    #[serde(default)]
    pub answer: Value,
}

/// DTO for submitting an exam. Answer `i` is graded against question `i`.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitExamResponse {
    pub submission_id: i64,
    pub score: f64,
    pub graded: bool,
    pub message: String,
}
