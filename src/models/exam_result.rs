// src/models/exam_result.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::store::{
    Record,
    fields::{Field, FieldType},
};

/// Represents the 'results' table in the database.
/// Written once a submission is fully graded; never changed by the grading flow.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub submission_id: i64,
    pub student_id: i64,
    pub exam_id: i64,
    pub score: f64,
    pub feedback: Option<String>,
    pub graded_at: DateTime<Utc>,
}

impl Record for ExamResult {
    const TABLE: &'static str = "results";
    const LABEL: &'static str = "Result";
    const FIELDS: &'static [Field] = &[
        Field::id(),
        Field::required("submission_id", FieldType::Integer),
        Field::required("student_id", FieldType::Integer),
        Field::required("exam_id", FieldType::Integer),
        Field::required("score", FieldType::Real),
        Field::optional("feedback", FieldType::Text),
        Field::optional("graded_at", FieldType::Timestamp),
    ];
}
