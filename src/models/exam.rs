// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::{
    models::question::{PublicQuestion, Question, check_questions, validate_questions},
    store::{
        Record,
        fields::{Field, FieldType},
    },
};

/// Whether students can see and submit an exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Enabled,
    Disabled,
}

impl AvailabilityStatus {
    pub const NAMES: &'static [&'static str] = &["enabled", "disabled"];

    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Enabled => "enabled",
            AvailabilityStatus::Disabled => "disabled",
        }
    }
}

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub class_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub total_score: i64,

    /// Ordered question list; answers are matched to it by position.
    pub questions: Json<Vec<Question>>,

    pub availability_status: AvailabilityStatus,

    /// Teacher who authored the exam.
    pub created_by: i64,

    pub created_at: DateTime<Utc>,
}

impl Exam {
    pub fn is_enabled(&self) -> bool {
        self.availability_status == AvailabilityStatus::Enabled
    }
}

impl Record for Exam {
    const TABLE: &'static str = "exams";
    const LABEL: &'static str = "Exam";
    const FIELDS: &'static [Field] = &[
        Field::id(),
        Field::required("class_id", FieldType::Integer),
        Field::required("title", FieldType::Text),
        Field::optional("description", FieldType::Text),
        Field::required("duration_minutes", FieldType::Integer),
        Field::required("total_score", FieldType::Integer),
        Field::optional("questions", FieldType::Json(check_questions)),
        Field::optional(
            "availability_status",
            FieldType::OneOf(AvailabilityStatus::NAMES),
        ),
        Field::required("created_by", FieldType::Integer),
        Field::optional("created_at", FieldType::Timestamp),
    ];
}

/// Exam as seen by a student: same shape, grading keys removed.
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentExamView {
    pub id: i64,
    pub class_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub total_score: i64,
    pub questions: Vec<PublicQuestion>,
    pub availability_status: AvailabilityStatus,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Exam> for StudentExamView {
    fn from(exam: Exam) -> Self {
        Self {
            questions: exam.questions.iter().map(PublicQuestion::from).collect(),
            id: exam.id,
            class_id: exam.class_id,
            title: exam.title,
            description: exam.description,
            duration_minutes: exam.duration_minutes,
            total_score: exam.total_score,
            availability_status: exam.availability_status,
            created_by: exam.created_by,
            created_at: exam.created_at,
        }
    }
}

/// Listing entry for a class's exams (questions omitted).
#[derive(Debug, Serialize, Deserialize)]
pub struct ExamSummary {
    pub id: i64,
    pub class_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub total_score: i64,
    pub availability_status: AvailabilityStatus,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub question_count: usize,
}

impl From<Exam> for ExamSummary {
    fn from(exam: Exam) -> Self {
        Self {
            question_count: exam.questions.len(),
            id: exam.id,
            class_id: exam.class_id,
            title: exam.title,
            description: exam.description,
            duration_minutes: exam.duration_minutes,
            total_score: exam.total_score,
            availability_status: exam.availability_status,
            created_by: exam.created_by,
            created_at: exam.created_at,
        }
    }
}

/// DTO for creating an exam.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateExamRequest {
    pub class_id: i64,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: i64,
    #[validate(range(min = 0))]
    pub total_score: i64,
    #[validate(custom(function = validate_questions))]
    pub questions: Vec<Question>,
}

/// DTO for switching an exam on or off.
#[derive(Debug, Deserialize)]
pub struct ToggleAvailabilityRequest {
    pub availability_status: AvailabilityStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleAvailabilityResponse {
    pub message: String,
    pub availability_status: AvailabilityStatus,
}
