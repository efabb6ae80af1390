// src/handlers/entities.rs

//! Generic CRUD surface shared by every record kind.
//!
//! Mounted once per kind under `/api/entities/<table>`; the field registry of
//! the kind decides which filter, sort and write keys are accepted.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use sqlx::SqlitePool;

use crate::{
    config::MAX_PAGE_LIMIT,
    error::AppError,
    state::AppState,
    store::{
        self, Record,
        query::{ListParams, ListQuery},
    },
};

/// DTO for batch create.
#[derive(Debug, Deserialize)]
pub struct BatchCreateRequest {
    pub items: Vec<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct BatchUpdateItem {
    pub id: i64,
    pub updates: Map<String, Value>,
}

/// DTO for batch update.
#[derive(Debug, Deserialize)]
pub struct BatchUpdateRequest {
    pub items: Vec<BatchUpdateItem>,
}

/// DTO for batch delete.
#[derive(Debug, Deserialize)]
pub struct BatchDeleteRequest {
    pub ids: Vec<i64>,
}

/// Routes for one record kind.
pub fn entity_router<R: Record>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/all", get(list::<R>))
        .route(
            "/batch",
            post(create_batch::<R>)
                .put(update_batch::<R>)
                .delete(delete_batch::<R>),
        )
        .route(
            "/{id}",
            get(get_one::<R>).put(update_one::<R>).delete(delete_one::<R>),
        )
}

/// Filtered, sorted, paginated listing.
pub async fn list<R: Record>(
    State(pool): State<SqlitePool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = ListQuery::from_params(params, MAX_PAGE_LIMIT)?;
    let page = store::list::<R>(&pool, &query).await?;
    tracing::debug!("Listed {} of {} {}", page.items.len(), page.total, R::TABLE);

    Ok(Json(page))
}

pub async fn get_one<R: Record>(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let record = store::get::<R>(&pool, id).await?;
    Ok(Json(record))
}

pub async fn create<R: Record>(
    State(pool): State<SqlitePool>,
    Json(values): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let record = store::create::<R>(&pool, &values).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn create_batch<R: Record>(
    State(pool): State<SqlitePool>,
    Json(payload): Json<BatchCreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let records = store::create_many::<R>(&pool, &payload.items).await?;
    tracing::info!("Batch created {} {}", records.len(), R::TABLE);

    Ok((StatusCode::CREATED, Json(records)))
}

/// Sparse update; 404 when the id does not exist.
pub async fn update_one<R: Record>(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(patch): Json<Map<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let record = store::update::<R>(&pool, id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", R::LABEL)))?;

    Ok(Json(record))
}

pub async fn update_batch<R: Record>(
    State(pool): State<SqlitePool>,
    Json(payload): Json<BatchUpdateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let items: Vec<(i64, Map<String, Value>)> = payload
        .items
        .into_iter()
        .map(|item| (item.id, item.updates))
        .collect();

    let records = store::update_many::<R>(&pool, &items).await?;
    tracing::info!("Batch updated {} {}", records.len(), R::TABLE);

    Ok(Json(records))
}

pub async fn delete_one<R: Record>(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !store::delete::<R>(&pool, id).await? {
        return Err(AppError::NotFound(format!("{} not found", R::LABEL)));
    }

    Ok(Json(json!({
        "message": format!("{} deleted successfully", R::LABEL),
        "id": id
    })))
}

pub async fn delete_batch<R: Record>(
    State(pool): State<SqlitePool>,
    Json(payload): Json<BatchDeleteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let deleted_count = store::delete_many::<R>(&pool, &payload.ids).await?;
    tracing::info!("Batch deleted {} {}", deleted_count, R::TABLE);

    Ok(Json(json!({
        "message": format!("Successfully deleted {} {}", deleted_count, R::TABLE),
        "deleted_count": deleted_count
    })))
}
