// src/models/user.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::store::{
    Record,
    fields::{Field, FieldType},
};

/// The three roles a user can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Teacher,
    Student,
}

impl Role {
    pub const NAMES: &'static [&'static str] = &["super_admin", "teacher", "student"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique login email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub role: Role,

    pub full_name: String,

    pub created_at: DateTime<Utc>,
}

impl Record for User {
    const TABLE: &'static str = "users";
    const LABEL: &'static str = "User";
    const FIELDS: &'static [Field] = &[
        Field::id(),
        Field::required("email", FieldType::Text),
        Field::required("password", FieldType::Password),
        Field::required("role", FieldType::OneOf(Role::NAMES)),
        Field::required("full_name", FieldType::Text),
        Field::optional("created_at", FieldType::Timestamp),
    ];
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for a super admin creating an account with an explicit role.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
    pub role: Role,
    #[validate(length(min = 1, max = 100))]
    pub full_name: String,
}

/// Identity of the caller, as carried by the access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub full_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_match_serde_representation() {
        for role in [Role::SuperAdmin, Role::Teacher, Role::Student] {
            let encoded = serde_json::to_value(role).unwrap();
            assert_eq!(encoded, serde_json::json!(role.as_str()));
            assert!(Role::NAMES.contains(&role.as_str()));
        }
    }

    #[test]
    fn password_is_never_serialized() {
        let user = User {
            id: 1,
            email: "a@b.c".into(),
            password: "$argon2id$secret".into(),
            role: Role::Student,
            full_name: "A".into(),
            created_at: Utc::now(),
        };
        let encoded = serde_json::to_value(&user).unwrap();
        assert!(encoded.get("password").is_none());
    }
}
