// src/store/fields.rs

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite};

use crate::{error::AppError, utils::hash::hash_password};

/// Storage type of a registered column.
/// Decides how loosely-typed JSON operands are checked and bound.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    /// Integer primary key. Queryable, never written by callers.
    Id,
    Integer,
    Real,
    Text,
    Bool,
    /// RFC 3339 timestamp stored as UTC text with millisecond precision
    /// (`2025-01-02T03:04:05.000Z`), the same shape the column defaults produce.
    Timestamp,
    /// Text restricted to a fixed set of values.
    OneOf(&'static [&'static str]),
    /// Structured column stored as JSON text. The checker deserializes the
    /// value into its typed form. Not usable in filters or sorting.
    Json(fn(&Value) -> Result<(), String>),
    /// Plain text on input, argon2 hash at rest. Not usable in filters or sorting.
    Password,
}

/// One entry of a record kind's field registry.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    /// Must be supplied (non-null) on create.
    pub required: bool,
}

impl Field {
    pub const fn id() -> Self {
        Self {
            name: "id",
            ty: FieldType::Id,
            required: false,
        }
    }

    pub const fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }

    /// Whether the field may appear in a filter or sort clause.
    pub fn is_queryable(&self) -> bool {
        !matches!(self.ty, FieldType::Json(_) | FieldType::Password)
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self.ty, FieldType::Id)
    }

    /// Converts an equality operand from a filter map.
    pub fn filter_value(&self, value: &Value) -> Result<SqlValue, AppError> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        match self.ty {
            FieldType::Timestamp => self.timestamp(value),
            _ => self.convert(value),
        }
    }

    /// Converts a value that is about to be written.
    pub fn write_value(&self, value: &Value) -> Result<SqlValue, AppError> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        match self.ty {
            FieldType::Timestamp => self.timestamp(value),
            FieldType::Json(check) => {
                check(value).map_err(|e| {
                    AppError::BadRequest(format!("Field '{}' is malformed: {}", self.name, e))
                })?;
                Ok(SqlValue::Text(value.to_string()))
            }
            FieldType::Password => {
                let raw = self.expect_str(value)?;
                if raw.is_empty() {
                    return Err(AppError::BadRequest("Password cannot be empty".to_string()));
                }
                Ok(SqlValue::Text(hash_password(raw)?))
            }
            _ => self.convert(value),
        }
    }

    fn convert(&self, value: &Value) -> Result<SqlValue, AppError> {
        match self.ty {
            FieldType::Id | FieldType::Integer => value
                .as_i64()
                .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
                .map(SqlValue::Integer)
                .ok_or_else(|| self.type_error("an integer")),
            FieldType::Real => value
                .as_f64()
                .map(SqlValue::Real)
                .ok_or_else(|| self.type_error("a number")),
            FieldType::Bool => value
                .as_bool()
                .or_else(|| match value.as_i64() {
                    Some(0) => Some(false),
                    Some(1) => Some(true),
                    _ => None,
                })
                .map(SqlValue::Bool)
                .ok_or_else(|| self.type_error("a boolean")),
            FieldType::OneOf(allowed) => {
                let raw = self.expect_str(value)?;
                if allowed.contains(&raw) {
                    Ok(SqlValue::Text(raw.to_string()))
                } else {
                    Err(AppError::BadRequest(format!(
                        "Field '{}' must be one of: {}",
                        self.name,
                        allowed.join(", ")
                    )))
                }
            }
            FieldType::Text | FieldType::Timestamp | FieldType::Password => {
                self.expect_str(value).map(|s| SqlValue::Text(s.to_string()))
            }
            FieldType::Json(_) => Err(AppError::BadRequest(format!(
                "Field '{}' cannot be used in a query",
                self.name
            ))),
        }
    }

    /// Parses any RFC 3339 offset and renders it in the stored form,
    /// so filter operands compare equal to written and defaulted values.
    fn timestamp(&self, value: &Value) -> Result<SqlValue, AppError> {
        let raw = self.expect_str(value)?;
        let parsed = raw.trim().parse::<DateTime<Utc>>().map_err(|_| {
            AppError::BadRequest(format!(
                "Field '{}' expects an RFC 3339 timestamp",
                self.name
            ))
        })?;
        Ok(SqlValue::Text(
            parsed.to_rfc3339_opts(SecondsFormat::Millis, true),
        ))
    }

    fn expect_str<'v>(&self, value: &'v Value) -> Result<&'v str, AppError> {
        value.as_str().ok_or_else(|| self.type_error("a string"))
    }

    fn type_error(&self, expected: &str) -> AppError {
        AppError::BadRequest(format!("Field '{}' expects {}", self.name, expected))
    }
}

/// Registry lookup by column name.
pub fn lookup<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find(|f| f.name == name)
}

/// Checker for `FieldType::Json` columns.
pub fn check_json<T: DeserializeOwned>(value: &Value) -> Result<(), String> {
    T::deserialize(value).map(|_| ()).map_err(|e| e.to_string())
}

/// A bindable SQL operand.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

/// Pushes a bound parameter for `value`.
pub fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: SqlValue) {
    match value {
        SqlValue::Null => builder.push_bind(Option::<String>::None),
        SqlValue::Integer(v) => builder.push_bind(v),
        SqlValue::Real(v) => builder.push_bind(v),
        SqlValue::Text(v) => builder.push_bind(v),
        SqlValue::Bool(v) => builder.push_bind(v),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STATUS: Field = Field::required("status", FieldType::OneOf(&["enabled", "disabled"]));

    #[test]
    fn integer_fields_accept_numeric_strings() {
        let field = Field::required("class_id", FieldType::Integer);
        assert_eq!(field.filter_value(&json!(7)).unwrap(), SqlValue::Integer(7));
        assert_eq!(field.filter_value(&json!("7")).unwrap(), SqlValue::Integer(7));
        assert!(field.filter_value(&json!("seven")).is_err());
    }

    #[test]
    fn one_of_rejects_values_outside_the_set() {
        assert_eq!(
            STATUS.write_value(&json!("enabled")).unwrap(),
            SqlValue::Text("enabled".to_string())
        );
        assert!(matches!(
            STATUS.write_value(&json!("archived")),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn json_fields_are_checked_and_not_queryable() {
        let field = Field::required("ids", FieldType::Json(check_json::<Vec<i64>>));
        assert!(!field.is_queryable());
        assert_eq!(
            field.write_value(&json!([1, 2])).unwrap(),
            SqlValue::Text("[1,2]".to_string())
        );
        assert!(field.write_value(&json!(["a"])).is_err());
    }

    #[test]
    fn null_operands_pass_through() {
        let field = Field::optional("score", FieldType::Real);
        assert_eq!(field.filter_value(&Value::Null).unwrap(), SqlValue::Null);
    }

    #[test]
    fn timestamps_are_normalized_on_write() {
        let field = Field::optional("created_at", FieldType::Timestamp);
        let value = field.write_value(&json!("2025-01-02T03:04:05Z")).unwrap();
        assert_eq!(value, SqlValue::Text("2025-01-02T03:04:05.000Z".to_string()));
        assert!(field.write_value(&json!("yesterday")).is_err());
    }

    #[test]
    fn timestamp_filters_use_the_stored_form() {
        let field = Field::optional("graded_at", FieldType::Timestamp);
        let stored = SqlValue::Text("2025-01-02T03:04:05.000Z".to_string());
        assert_eq!(field.filter_value(&json!("2025-01-02T03:04:05Z")).unwrap(), stored);
        assert_eq!(field.filter_value(&json!("2025-01-02T05:04:05+02:00")).unwrap(), stored);
        assert_eq!(
            field.filter_value(&json!("2025-01-02T03:04:05.120Z")).unwrap(),
            SqlValue::Text("2025-01-02T03:04:05.120Z".to_string())
        );
        assert!(matches!(
            field.filter_value(&json!("last week")),
            Err(AppError::BadRequest(_))
        ));
    }
}
