// src/handlers/classes.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Map, json};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::DOMAIN_LIST_LIMIT,
    error::AppError,
    models::{
        class::{Class, CreateClassRequest, EnrollStudentRequest, EnrollmentResponse},
        exam::{AvailabilityStatus, Exam, ExamSummary},
        user::{Role, User},
    },
    store::{self, enrollment, query::ListQuery},
    utils::{
        access::{ensure_class_access, ensure_class_manager, require_role},
        html::clean_html,
        jwt::Claims,
    },
};

/// Creates a new class owned by the calling teacher.
pub async fn create_class(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateClassRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_role(&claims, &[Role::Teacher], "Only teachers can create classes")?;
    payload.validate()?;

    let mut values = Map::new();
    values.insert("class_name".into(), json!(clean_html(&payload.class_name)));
    values.insert("subject".into(), json!(clean_html(&payload.subject)));
    values.insert("teacher_id".into(), json!(teacher_id));

    let class = store::create::<Class>(&pool, &values).await?;
    tracing::info!("Teacher {} created class {}", teacher_id, class.id);

    Ok((StatusCode::CREATED, Json(class)))
}

/// Lists classes by role: a teacher's own, a student's enrolled, or all for super admin.
pub async fn list_classes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let query = ListQuery {
        limit: DOMAIN_LIST_LIMIT,
        ..ListQuery::default()
    };

    let (classes, total) = match claims.role {
        Role::Teacher => {
            let page = store::list::<Class>(&pool, &query.with_filter("teacher_id", user_id)).await?;
            (page.items, page.total)
        }
        Role::Student => enrollment::classes_for_student(&pool, user_id, DOMAIN_LIST_LIMIT).await?,
        Role::SuperAdmin => {
            let page = store::list::<Class>(&pool, &query).await?;
            (page.items, page.total)
        }
    };

    Ok(Json(json!({
        "classes": classes,
        "total": total
    })))
}

/// Gets class details. Teachers must own it, students must be enrolled.
pub async fn get_class(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let class = store::get::<Class>(&pool, id).await?;
    ensure_class_access(&class, &claims)?;

    Ok(Json(class))
}

/// Enrolls a student. Enrolling twice is a no-op.
pub async fn enroll_student(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<EnrollStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let class = store::get::<Class>(&pool, id).await?;
    ensure_class_manager(&class, &claims)?;

    let student = store::get::<User>(&pool, payload.student_id).await?;
    if student.role != Role::Student {
        return Err(AppError::BadRequest(format!(
            "User {} is not a student",
            student.id
        )));
    }

    if enrollment::enroll(&pool, class.id, student.id).await? {
        tracing::info!("Enrolled student {} in class {}", student.id, class.id);
    }

    let class = store::get::<Class>(&pool, id).await?;
    Ok(Json(EnrollmentResponse {
        message: "Student enrolled successfully".to_string(),
        student_ids: class.student_ids.0,
    }))
}

/// Removes a student from a class. Removing an absent student is a no-op.
pub async fn remove_student(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path((id, student_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let class = store::get::<Class>(&pool, id).await?;
    ensure_class_manager(&class, &claims)?;

    if enrollment::unenroll(&pool, class.id, student_id).await? {
        tracing::info!("Removed student {} from class {}", student_id, class.id);
    }

    let class = store::get::<Class>(&pool, id).await?;
    Ok(Json(EnrollmentResponse {
        message: "Student removed successfully".to_string(),
        student_ids: class.student_ids.0,
    }))
}

/// Lists a class's exams without their questions.
/// Students only see enabled exams.
pub async fn list_class_exams(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let class = store::get::<Class>(&pool, id).await?;
    ensure_class_access(&class, &claims)?;

    let mut query = ListQuery {
        limit: DOMAIN_LIST_LIMIT,
        ..ListQuery::default()
    }
    .with_filter("class_id", class.id);

    if claims.role == Role::Student {
        query = query.with_filter(
            "availability_status",
            AvailabilityStatus::Enabled.as_str(),
        );
    }

    let page = store::list::<Exam>(&pool, &query).await?.map(ExamSummary::from);

    Ok(Json(json!({
        "exams": page.items,
        "total": page.total
    })))
}
