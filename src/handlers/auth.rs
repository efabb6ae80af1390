// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Extension, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Map, json};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::{Config, MAX_PAGE_LIMIT, TOKEN_TTL_SECONDS},
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, MeResponse, User},
    store::{
        self,
        query::{ListParams, ListQuery},
    },
    utils::{
        hash::verify_password,
        html::clean_html,
        jwt::{Claims, sign_jwt},
    },
};

/// Authenticates a user and returns a JWT token.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(payload.email.trim())
        .fetch_optional(&pool)
        .await?;

    let invalid = || AppError::AuthError("Invalid email or password".to_string());
    let user = user.ok_or_else(invalid)?;

    if !verify_password(&payload.password, &user.password)? {
        tracing::warn!("Failed login attempt for user {}", user.id);
        return Err(invalid());
    }

    let token = sign_jwt(&user, &config.jwt_secret, TOKEN_TTL_SECONDS)?;
    tracing::info!("User {} logged in", user.id);

    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "user": MeResponse {
            id: user.id,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
        }
    })))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> impl IntoResponse {
    Json(json!({ "message": "Logged out successfully" }))
}

/// Returns the caller's identity as carried by the token.
pub async fn me(Extension(claims): Extension<Claims>) -> Result<impl IntoResponse, AppError> {
    Ok(Json(MeResponse {
        id: claims.user_id()?,
        email: claims.email,
        role: claims.role,
        full_name: claims.full_name,
    }))
}

/// Creates a new user with a specific role.
/// Super admin only.
pub async fn create_user(
    State(pool): State<SqlitePool>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut values = Map::new();
    values.insert("email".into(), json!(payload.email.trim()));
    values.insert("password".into(), json!(payload.password));
    values.insert("role".into(), json!(payload.role));
    values.insert("full_name".into(), json!(clean_html(&payload.full_name)));

    let user = store::create::<User>(&pool, &values)
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "User with email '{}' already exists",
                payload.email
            )),
            other => other,
        })?;

    tracing::info!("Created {} account {}", user.role, user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": user.id,
            "email": user.email,
            "role": user.role,
            "full_name": user.full_name,
            "message": "User created successfully"
        })),
    ))
}

/// Lists users, newest first.
/// Super admin only.
pub async fn list_users(
    State(pool): State<SqlitePool>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, AppError> {
    let query = ListQuery::from_params(params, MAX_PAGE_LIMIT)?;
    let page = store::list::<User>(&pool, &query).await?;

    Ok(Json(json!({
        "users": page.items,
        "total": page.total
    })))
}
