// src/store/query.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{QueryBuilder, Sqlite};

use crate::{
    config::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT},
    error::AppError,
    store::fields::{Field, SqlValue, lookup, push_value},
};

/// Raw list parameters as they arrive on the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// JSON object of equality filters, e.g. `{"exam_id": 3}`.
    pub query: Option<String>,
    /// Field name, `-` prefix for descending.
    pub sort: Option<String>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Sort directive parsed from `field` / `-field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub descending: bool,
}

impl Sort {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let (field, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw, false),
        };
        if field.is_empty() {
            return None;
        }
        Some(Self {
            field: field.to_string(),
            descending,
        })
    }
}

/// A validated-shape list request. Field names are checked against the
/// record kind's registry when the query is executed.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub filter: Map<String, Value>,
    pub sort: Option<Sort>,
    pub skip: i64,
    pub limit: i64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            filter: Map::new(),
            sort: None,
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl ListQuery {
    /// Parses query-string parameters. `limit` is clamped to `[1, max_limit]`,
    /// a negative `skip` is rejected.
    pub fn from_params(params: ListParams, max_limit: i64) -> Result<Self, AppError> {
        let filter = match params.query.as_deref().map(str::trim) {
            None | Some("") => Map::new(),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Object(map)) => map,
                _ => return Err(AppError::BadRequest("Invalid query JSON format".to_string())),
            },
        };

        let skip = params.skip.unwrap_or(0);
        if skip < 0 {
            return Err(AppError::BadRequest("skip must be >= 0".to_string()));
        }

        let limit = params
            .limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, max_limit.clamp(1, MAX_PAGE_LIMIT));

        let sort = match params.sort.as_deref() {
            None => None,
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(
                Sort::parse(raw)
                    .ok_or_else(|| AppError::BadRequest(format!("Invalid sort '{}'", raw)))?,
            ),
        };

        Ok(Self {
            filter,
            sort,
            skip,
            limit,
        })
    }

    /// Adds an equality predicate, replacing any caller-supplied value for `field`.
    pub fn with_filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filter.insert(field.to_string(), value.into());
        self
    }
}

/// One page of a list result.
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            skip: self.skip,
            limit: self.limit,
        }
    }
}

fn queryable_field<'a>(
    fields: &'a [Field],
    name: &str,
    label: &str,
    usage: &str,
) -> Result<&'a Field, AppError> {
    lookup(fields, name)
        .filter(|f| f.is_queryable())
        .ok_or_else(|| AppError::BadRequest(format!("Unknown {} field '{}' for {}", usage, name, label)))
}

/// Appends ` WHERE ...` for the conjunction of all equality predicates.
pub fn push_filter(
    builder: &mut QueryBuilder<'_, Sqlite>,
    fields: &[Field],
    label: &str,
    filter: &Map<String, Value>,
) -> Result<(), AppError> {
    builder.push(" WHERE 1 = 1");
    for (name, value) in filter {
        let field = queryable_field(fields, name, label, "filter")?;
        let operand = field.filter_value(value)?;
        builder.push(" AND ");
        builder.push(field.name);
        if operand == SqlValue::Null {
            builder.push(" IS NULL");
        } else {
            builder.push(" = ");
            push_value(builder, operand);
        }
    }
    Ok(())
}

/// Appends ` ORDER BY ...`. Without an explicit sort, newest first.
pub fn push_order(
    builder: &mut QueryBuilder<'_, Sqlite>,
    fields: &[Field],
    label: &str,
    sort: Option<&Sort>,
) -> Result<(), AppError> {
    match sort {
        None => {
            builder.push(" ORDER BY id DESC");
        }
        Some(sort) => {
            let field = queryable_field(fields, &sort.field, label, "sort")?;
            builder.push(" ORDER BY ");
            builder.push(field.name);
            builder.push(if sort.descending { " DESC" } else { " ASC" });
            if field.name != "id" {
                builder.push(", id DESC");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fields::FieldType;

    const FIELDS: &[Field] = &[
        Field::id(),
        Field::required("exam_id", FieldType::Integer),
        Field::optional("graded", FieldType::Bool),
        Field::required("answers", FieldType::Json(crate::store::fields::check_json::<Vec<Value>>)),
    ];

    fn params(query: Option<&str>, sort: Option<&str>, skip: Option<i64>, limit: Option<i64>) -> ListParams {
        ListParams {
            query: query.map(str::to_string),
            sort: sort.map(str::to_string),
            skip,
            limit,
        }
    }

    #[test]
    fn sort_prefix_selects_direction() {
        assert_eq!(
            Sort::parse("-score"),
            Some(Sort { field: "score".into(), descending: true })
        );
        assert_eq!(
            Sort::parse("title"),
            Some(Sort { field: "title".into(), descending: false })
        );
        assert_eq!(Sort::parse("-"), None);
    }

    #[test]
    fn limit_is_clamped() {
        let q = ListQuery::from_params(params(None, None, None, Some(0)), MAX_PAGE_LIMIT).unwrap();
        assert_eq!(q.limit, 1);
        let q = ListQuery::from_params(params(None, None, None, Some(50_000)), MAX_PAGE_LIMIT).unwrap();
        assert_eq!(q.limit, MAX_PAGE_LIMIT);
        let q = ListQuery::from_params(params(None, None, None, Some(500)), 100).unwrap();
        assert_eq!(q.limit, 100);
        let q = ListQuery::from_params(params(None, None, None, None), MAX_PAGE_LIMIT).unwrap();
        assert_eq!(q.limit, DEFAULT_PAGE_LIMIT);
    }

    #[test]
    fn negative_skip_and_bad_json_are_rejected() {
        assert!(ListQuery::from_params(params(None, None, Some(-1), None), MAX_PAGE_LIMIT).is_err());
        assert!(ListQuery::from_params(params(Some("{not json"), None, None, None), MAX_PAGE_LIMIT).is_err());
        assert!(ListQuery::from_params(params(Some("[1, 2]"), None, None, None), MAX_PAGE_LIMIT).is_err());
    }

    #[test]
    fn filter_builds_conjunction() {
        let query = ListQuery::from_params(
            params(Some(r#"{"exam_id": 4, "graded": true}"#), None, None, None),
            MAX_PAGE_LIMIT,
        )
        .unwrap();
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM submissions");
        push_filter(&mut builder, FIELDS, "submissions", &query.filter).unwrap();
        let sql = builder.sql();
        assert!(sql.contains("exam_id = ?"));
        assert!(sql.contains("graded = ?"));
        assert!(sql.contains(" AND "));
    }

    #[test]
    fn unknown_or_structured_fields_are_rejected() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM submissions");
        let filter = ListQuery::default().with_filter("password", "x").filter;
        assert!(push_filter(&mut builder, FIELDS, "submissions", &filter).is_err());

        let filter = ListQuery::default().with_filter("answers", "[]").filter;
        assert!(push_filter(&mut builder, FIELDS, "submissions", &filter).is_err());

        let sort = Sort::parse("-nonexistent").unwrap();
        assert!(push_order(&mut builder, FIELDS, "submissions", Some(&sort)).is_err());
    }

    #[test]
    fn default_order_is_newest_first() {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM submissions");
        push_order(&mut builder, FIELDS, "submissions", None).unwrap();
        assert!(builder.sql().ends_with("ORDER BY id DESC"));
    }
}
