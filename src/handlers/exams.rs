// src/handlers/exams.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, json};
use sqlx::{Sqlite, SqlitePool, Transaction};
use validator::Validate;

use crate::{
    config::{AUTO_GRADED_FEEDBACK, DOMAIN_LIST_LIMIT},
    error::AppError,
    models::{
        class::Class,
        exam::{
            AvailabilityStatus, CreateExamRequest, Exam, StudentExamView,
            ToggleAvailabilityRequest, ToggleAvailabilityResponse,
        },
        exam_result::ExamResult,
        submission::{SubmitExamRequest, SubmitExamResponse, Submission},
        user::Role,
    },
    store::{self, query::ListQuery},
    utils::{
        access::{ensure_class_access, ensure_class_owner, require_role},
        grading::{GradingOutcome, grade_submission},
        html::{clean_html, clean_optional},
        jwt::Claims,
    },
};

/// Loads the class an exam belongs to.
async fn class_of(pool: &SqlitePool, exam: &Exam) -> Result<Class, AppError> {
    store::find::<Class>(pool, exam.class_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Class not found".to_string()))
}

/// Creates a new exam in a class the calling teacher owns.
/// New exams always start disabled.
pub async fn create_exam(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(mut payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let teacher_id = require_role(&claims, &[Role::Teacher], "Only teachers can create exams")?;
    payload.validate()?;

    let class = store::get::<Class>(&pool, payload.class_id).await?;
    ensure_class_owner(&class, &claims)?;

    for question in &mut payload.questions {
        question.prompt = clean_optional(question.prompt.as_deref());
    }

    let mut values = Map::new();
    values.insert("class_id".into(), json!(class.id));
    values.insert("title".into(), json!(clean_html(&payload.title)));
    values.insert(
        "description".into(),
        json!(clean_optional(payload.description.as_deref())),
    );
    values.insert("duration_minutes".into(), json!(payload.duration_minutes));
    values.insert("total_score".into(), json!(payload.total_score));
    values.insert("questions".into(), serde_json::to_value(&payload.questions)?);
    values.insert(
        "availability_status".into(),
        json!(AvailabilityStatus::Disabled.as_str()),
    );
    values.insert("created_by".into(), json!(teacher_id));

    let exam = store::create::<Exam>(&pool, &values).await?;
    tracing::info!(
        "Teacher {} created exam {} in class {}",
        teacher_id,
        exam.id,
        class.id
    );

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Gets exam details.
///
/// Students must be enrolled and the exam enabled; they never see grading keys.
pub async fn get_exam(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let exam = store::get::<Exam>(&pool, id).await?;
    let class = class_of(&pool, &exam).await?;
    ensure_class_access(&class, &claims)?;

    if claims.role == Role::Student {
        if !exam.is_enabled() {
            return Err(AppError::Forbidden("Exam is not available".to_string()));
        }
        return Ok(Json(StudentExamView::from(exam)).into_response());
    }

    Ok(Json(exam).into_response())
}

/// Enables or disables an exam. Owning teacher only.
pub async fn toggle_availability(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<ToggleAvailabilityRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_role(
        &claims,
        &[Role::Teacher],
        "Only teachers can toggle exam availability",
    )?;

    let exam = store::get::<Exam>(&pool, id).await?;
    let class = class_of(&pool, &exam).await?;
    ensure_class_owner(&class, &claims).map_err(|_| AppError::Forbidden("Not your exam".to_string()))?;

    let mut patch = Map::new();
    patch.insert(
        "availability_status".into(),
        json!(payload.availability_status.as_str()),
    );

    let exam = store::update::<Exam>(&pool, id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(ToggleAvailabilityResponse {
        message: "Exam availability updated".to_string(),
        availability_status: exam.availability_status,
    }))
}

/// Persists the submission and, when fully graded, its result.
async fn record_submission(
    tx: &mut Transaction<'_, Sqlite>,
    exam: &Exam,
    student_id: i64,
    outcome: &GradingOutcome,
) -> Result<Submission, AppError> {
    let mut values = Map::new();
    values.insert("exam_id".into(), json!(exam.id));
    values.insert("student_id".into(), json!(student_id));
    values.insert("answers".into(), serde_json::to_value(&outcome.answers)?);
    values.insert("score".into(), json!(outcome.stored_score()));
    values.insert("graded".into(), json!(outcome.graded));

    let submission = store::insert_row::<Submission>(tx, &values).await?;

    if outcome.graded {
        let mut result = Map::new();
        result.insert("submission_id".into(), json!(submission.id));
        result.insert("student_id".into(), json!(student_id));
        result.insert("exam_id".into(), json!(exam.id));
        result.insert("score".into(), json!(outcome.score));
        result.insert("feedback".into(), json!(AUTO_GRADED_FEEDBACK));

        store::insert_row::<ExamResult>(tx, &result).await?;
    }

    Ok(submission)
}

/// Submits answers for an exam and auto-grades objective questions.
///
/// The submission and its result are written in one transaction.
/// A student can submit each exam once.
pub async fn submit_exam(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = require_role(&claims, &[Role::Student], "Only students can submit exams")?;

    let exam = store::get::<Exam>(&pool, id).await?;
    if !exam.is_enabled() {
        return Err(AppError::Forbidden("Exam is not available".to_string()));
    }

    let class = class_of(&pool, &exam).await?;
    if !class.has_student(student_id) {
        return Err(AppError::Forbidden(
            "Not enrolled in this class".to_string(),
        ));
    }

    let outcome = grade_submission(&exam.questions, payload.answers)?;

    let mut tx = pool.begin().await?;
    let written = record_submission(&mut tx, &exam, student_id, &outcome).await;
    let submission = store::finish(tx, written).await.map_err(|e| match e {
        AppError::Conflict(_) => {
            AppError::Conflict("You have already submitted this exam".to_string())
        }
        other => other,
    })?;

    tracing::info!(
        "Student {} submitted exam {} (graded: {}, score: {})",
        student_id,
        exam.id,
        submission.graded,
        outcome.score
    );

    let message = if submission.graded {
        "Exam submitted successfully"
    } else {
        "Exam submitted, awaiting manual grading"
    };

    Ok((
        StatusCode::CREATED,
        Json(SubmitExamResponse {
            submission_id: submission.id,
            score: outcome.stored_score(),
            graded: submission.graded,
            message: message.to_string(),
        }),
    ))
}

/// Lists every submission of an exam. Owning teacher only.
pub async fn list_submissions(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    require_role(
        &claims,
        &[Role::Teacher],
        "Only teachers can view submissions",
    )?;

    let exam = store::get::<Exam>(&pool, id).await?;
    let class = class_of(&pool, &exam).await?;
    ensure_class_owner(&class, &claims).map_err(|_| AppError::Forbidden("Not your exam".to_string()))?;

    let query = ListQuery {
        limit: DOMAIN_LIST_LIMIT,
        ..ListQuery::default()
    }
    .with_filter("exam_id", exam.id);

    let page = store::list::<Submission>(&pool, &query).await?;

    Ok(Json(json!({
        "submissions": page.items,
        "total": page.total
    })))
}
