// src/store/mod.rs

//! Generic record persistence over SQLite.
//!
//! Every record kind registers its table and fields through [`Record`];
//! create/read/update/delete and filtered listing are then shared by all
//! kinds. Each write runs in its own transaction.

pub mod enrollment;
pub mod fields;
pub mod query;

use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::{
    Executor, FromRow, QueryBuilder, Sqlite, SqlitePool, Transaction, sqlite::SqliteRow,
};

use crate::error::AppError;

use self::{
    fields::{Field, lookup, push_value},
    query::{ListQuery, Page, push_filter, push_order},
};

/// A stored record kind with a compile-time field registry.
pub trait Record: for<'r> FromRow<'r, SqliteRow> + Serialize + Send + Sync + Unpin + 'static {
    /// Table name.
    const TABLE: &'static str;
    /// Human-readable name used in error messages.
    const LABEL: &'static str;
    /// Every column callers may filter, sort or write.
    const FIELDS: &'static [Field];
    /// Projection used when reading rows back.
    const SELECT: &'static str = "*";
}

fn select_sql<R: Record>() -> String {
    format!("SELECT {} FROM {}", R::SELECT, R::TABLE)
}

/// Commits on success, rolls back explicitly on failure.
pub async fn finish<T>(
    tx: Transaction<'_, Sqlite>,
    outcome: Result<T, AppError>,
) -> Result<T, AppError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!("Rollback failed: {:?}", rollback_err);
            }
            Err(err)
        }
    }
}

/// Reads a record by id with any executor (pool or open transaction).
pub async fn fetch_by_id<'e, R, E>(executor: E, id: i64) -> Result<Option<R>, AppError>
where
    R: Record,
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{} WHERE id = ?", select_sql::<R>());
    let record = sqlx::query_as::<_, R>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(record)
}

pub async fn find<R: Record>(pool: &SqlitePool, id: i64) -> Result<Option<R>, AppError> {
    fetch_by_id::<R, _>(pool, id).await
}

/// Like [`find`], but a missing record is `NotFound`.
pub async fn get<R: Record>(pool: &SqlitePool, id: i64) -> Result<R, AppError> {
    find::<R>(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", R::LABEL)))
}

/// Filtered, sorted, paginated listing. `total` counts every match,
/// independent of `skip` and `limit`.
pub async fn list<R: Record>(pool: &SqlitePool, query: &ListQuery) -> Result<Page<R>, AppError> {
    let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {}", R::TABLE));
    push_filter(&mut count, R::FIELDS, R::TABLE, &query.filter)?;
    let total: i64 = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Sqlite>::new(select_sql::<R>());
    push_filter(&mut select, R::FIELDS, R::TABLE, &query.filter)?;
    push_order(&mut select, R::FIELDS, R::TABLE, query.sort.as_ref())?;
    select.push(" LIMIT ");
    select.push_bind(query.limit);
    select.push(" OFFSET ");
    select.push_bind(query.skip);

    let items = select.build_query_as::<R>().fetch_all(pool).await?;

    Ok(Page {
        items,
        total,
        skip: query.skip,
        limit: query.limit,
    })
}

fn writable_field<R: Record>(name: &str) -> Result<&'static Field, AppError> {
    lookup(R::FIELDS, name)
        .filter(|f| f.is_writable())
        .ok_or_else(|| {
            AppError::BadRequest(format!("Unknown or read-only field '{}' for {}", name, R::TABLE))
        })
}

/// Inserts inside a caller-owned transaction.
pub async fn insert_row<R: Record>(
    tx: &mut Transaction<'_, Sqlite>,
    values: &Map<String, Value>,
) -> Result<R, AppError> {
    let mut columns = Vec::new();
    let mut operands = Vec::new();
    for (name, value) in values {
        let field = writable_field::<R>(name)?;
        if value.is_null() {
            continue;
        }
        columns.push(field.name);
        operands.push(field.write_value(value)?);
    }

    if let Some(missing) = R::FIELDS
        .iter()
        .find(|f| f.required && !columns.contains(&f.name))
    {
        return Err(AppError::BadRequest(format!(
            "Missing required field '{}'",
            missing.name
        )));
    }

    let mut builder = QueryBuilder::<Sqlite>::new(format!("INSERT INTO {} (", R::TABLE));
    builder.push(columns.join(", "));
    builder.push(") VALUES (");
    for (idx, operand) in operands.into_iter().enumerate() {
        if idx > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, operand);
    }
    builder.push(") RETURNING id");

    let id: i64 = builder.build_query_scalar::<i64>().fetch_one(&mut **tx).await?;

    fetch_by_id::<R, _>(&mut **tx, id)
        .await?
        .ok_or_else(|| AppError::InternalServerError(format!("{} vanished after insert", R::LABEL)))
}

async fn update_row<R: Record>(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
    patch: &Map<String, Value>,
) -> Result<Option<R>, AppError> {
    let mut assignments = Vec::new();
    for (name, value) in patch {
        let field = writable_field::<R>(name)?;
        // Sparse merge: null means "leave as is".
        if value.is_null() {
            continue;
        }
        assignments.push((field.name, field.write_value(value)?));
    }

    if !assignments.is_empty() {
        let mut builder = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET ", R::TABLE));
        for (idx, (column, operand)) in assignments.into_iter().enumerate() {
            if idx > 0 {
                builder.push(", ");
            }
            builder.push(column);
            builder.push(" = ");
            push_value(&mut builder, operand);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&mut **tx).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
    }

    fetch_by_id::<R, _>(&mut **tx, id).await
}

async fn delete_row<R: Record>(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<bool, AppError> {
    let sql = format!("DELETE FROM {} WHERE id = ?", R::TABLE);
    let result = sqlx::query(&sql).bind(id).execute(&mut **tx).await?;
    Ok(result.rows_affected() > 0)
}

/// Inserts one record from a loosely-typed field map.
pub async fn create<R: Record>(pool: &SqlitePool, values: &Map<String, Value>) -> Result<R, AppError> {
    let mut tx = pool.begin().await?;
    let outcome = insert_row::<R>(&mut tx, values).await;
    let record = finish(tx, outcome).await?;
    tracing::info!("Created {} record", R::TABLE);
    Ok(record)
}

/// Sparse update: present non-null fields overwrite, everything else is kept.
/// Returns `None` when the id does not exist.
pub async fn update<R: Record>(
    pool: &SqlitePool,
    id: i64,
    patch: &Map<String, Value>,
) -> Result<Option<R>, AppError> {
    let mut tx = pool.begin().await?;
    let outcome = update_row::<R>(&mut tx, id, patch).await;
    let record = finish(tx, outcome).await?;
    if record.is_some() {
        tracing::info!("Updated {} {}", R::TABLE, id);
    } else {
        tracing::warn!("{} {} not found for update", R::LABEL, id);
    }
    Ok(record)
}

pub async fn delete<R: Record>(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;
    let outcome = delete_row::<R>(&mut tx, id).await;
    let deleted = finish(tx, outcome).await?;
    if deleted {
        tracing::info!("Deleted {} {}", R::TABLE, id);
    } else {
        tracing::warn!("{} {} not found for deletion", R::LABEL, id);
    }
    Ok(deleted)
}

/// Batch create. Items are applied one by one, each in its own transaction;
/// the first failure stops the batch and earlier items stay committed.
pub async fn create_many<R: Record>(
    pool: &SqlitePool,
    items: &[Map<String, Value>],
) -> Result<Vec<R>, AppError> {
    let mut created = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        match create::<R>(pool, item).await {
            Ok(record) => created.push(record),
            Err(err) => {
                tracing::error!(
                    "Batch create on {} failed at item {} ({} committed): {}",
                    R::TABLE,
                    idx,
                    created.len(),
                    err
                );
                return Err(err);
            }
        }
    }
    Ok(created)
}

/// Batch update with the same per-item semantics as [`create_many`].
/// Ids that do not exist are skipped.
pub async fn update_many<R: Record>(
    pool: &SqlitePool,
    items: &[(i64, Map<String, Value>)],
) -> Result<Vec<R>, AppError> {
    let mut updated = Vec::with_capacity(items.len());
    for (idx, (id, patch)) in items.iter().enumerate() {
        match update::<R>(pool, *id, patch).await {
            Ok(Some(record)) => updated.push(record),
            Ok(None) => {}
            Err(err) => {
                tracing::error!(
                    "Batch update on {} failed at item {} ({} committed): {}",
                    R::TABLE,
                    idx,
                    updated.len(),
                    err
                );
                return Err(err);
            }
        }
    }
    Ok(updated)
}

/// Batch delete. Returns how many of the ids were removed.
pub async fn delete_many<R: Record>(pool: &SqlitePool, ids: &[i64]) -> Result<u64, AppError> {
    let mut deleted = 0;
    for id in ids {
        if delete::<R>(pool, *id).await? {
            deleted += 1;
        }
    }
    Ok(deleted)
}
