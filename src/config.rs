// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Signing secret used when `JWT_SECRET` is not set.
/// Development only: never deploy with this value.
pub const INSECURE_DEFAULT_JWT_SECRET: &str = "testify-insecure-dev-secret-change-me";

/// Access tokens are valid for 24 hours from issuance.
pub const TOKEN_TTL_SECONDS: u64 = 24 * 60 * 60;

/// Page size used by list endpoints when `limit` is omitted.
pub const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Upper bound for `limit` on the generic list endpoints.
pub const MAX_PAGE_LIMIT: i64 = 2000;

/// Page size cap for the class/exam/submission listings of the domain surface.
pub const DOMAIN_LIST_LIMIT: i64 = 100;

/// Feedback stored on results created by the auto-grader.
pub const AUTO_GRADED_FEEDBACK: &str = "Auto-graded";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_full_name: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://testify.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| INSECURE_DEFAULT_JWT_SECRET.to_string());

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            admin_full_name: env::var("ADMIN_FULL_NAME")
                .unwrap_or_else(|_| "Super Administrator".to_string()),
        }
    }

    pub fn uses_insecure_secret(&self) -> bool {
        self.jwt_secret == INSECURE_DEFAULT_JWT_SECRET
    }
}
