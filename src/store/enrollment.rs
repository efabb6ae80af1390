// src/store/enrollment.rs

//! The class/student enrollment relation.
//!
//! One row per (class, student). Enrolling is an insert-or-ignore and
//! unenrolling a plain delete, so both are idempotent and never read the
//! current membership first.

use sqlx::SqlitePool;

use crate::{error::AppError, models::class::Class, store::Record};

/// Adds the student to the class. Returns false when already enrolled.
pub async fn enroll(pool: &SqlitePool, class_id: i64, student_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO class_students (class_id, student_id) VALUES (?, ?)",
    )
    .bind(class_id)
    .bind(student_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Removes the student from the class. Returns false when not enrolled.
pub async fn unenroll(pool: &SqlitePool, class_id: i64, student_id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM class_students WHERE class_id = ? AND student_id = ?")
        .bind(class_id)
        .bind(student_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Classes the student is enrolled in, newest first, with the exact count.
pub async fn classes_for_student(
    pool: &SqlitePool,
    student_id: i64,
    limit: i64,
) -> Result<(Vec<Class>, i64), AppError> {
    const MEMBERSHIP: &str = "id IN (SELECT class_id FROM class_students WHERE student_id = ?)";

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {} WHERE {}",
        Class::TABLE,
        MEMBERSHIP
    ))
    .bind(student_id)
    .fetch_one(pool)
    .await?;

    let classes = sqlx::query_as::<_, Class>(&format!(
        "SELECT {} FROM {} WHERE {} ORDER BY id DESC LIMIT ?",
        Class::SELECT,
        Class::TABLE,
        MEMBERSHIP
    ))
    .bind(student_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok((classes, total))
}
