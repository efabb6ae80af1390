// src/models/class.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

use crate::store::{
    Record,
    fields::{Field, FieldType},
};

/// Represents the 'classes' table joined with its enrollment relation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub class_name: String,
    pub subject: String,

    /// Owning teacher.
    pub teacher_id: i64,

    /// Enrolled students, aggregated from `class_students`.
    pub student_ids: Json<Vec<i64>>,

    pub created_at: DateTime<Utc>,
}

impl Class {
    pub fn is_taught_by(&self, user_id: i64) -> bool {
        self.teacher_id == user_id
    }

    pub fn has_student(&self, user_id: i64) -> bool {
        self.student_ids.contains(&user_id)
    }
}

impl Record for Class {
    const TABLE: &'static str = "classes";
    const LABEL: &'static str = "Class";
    const FIELDS: &'static [Field] = &[
        Field::id(),
        Field::required("class_name", FieldType::Text),
        Field::required("subject", FieldType::Text),
        Field::required("teacher_id", FieldType::Integer),
        Field::optional("created_at", FieldType::Timestamp),
    ];
    const SELECT: &'static str = "classes.*, \
        (SELECT json_group_array(cs.student_id) FROM class_students cs WHERE cs.class_id = classes.id) \
        AS student_ids";
}

/// DTO for creating a class.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassRequest {
    #[validate(length(min = 1, max = 200))]
    pub class_name: String,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
}

/// DTO for enrolling a student.
#[derive(Debug, Deserialize)]
pub struct EnrollStudentRequest {
    pub student_id: i64,
}

/// Response for enroll/unenroll.
#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollmentResponse {
    pub message: String,
    pub student_ids: Vec<i64>,
}
