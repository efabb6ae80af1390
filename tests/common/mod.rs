// tests/common/mod.rs

#![allow(dead_code)]

use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;
use testify::{config::Config, db, routes, state::AppState};

pub const ADMIN_EMAIL: &str = "admin@testify.test";
pub const ADMIN_PASSWORD: &str = "admin-password";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub admin_token: String,
}

/// Spawns the app on a random port, backed by a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    // 1. A single long-lived connection keeps the in-memory database alive
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    // 2. Run migrations
    db::migrate(&pool).await.expect("Failed to migrate database");

    // 3. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        admin_email: Some(ADMIN_EMAIL.to_string()),
        admin_password: Some(ADMIN_PASSWORD.to_string()),
        admin_full_name: "Test Admin".to_string(),
    };

    db::seed_admin_user(&pool, &config)
        .await
        .expect("Failed to seed admin");

    let state = AppState { pool, config };

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = reqwest::Client::new();
    let admin_token = login(&client, &address, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    TestApp {
        address,
        client,
        admin_token,
    }
}

pub async fn login(client: &reqwest::Client, address: &str, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200, "login failed for {}", email);

    let body: Value = response.json().await.unwrap();
    body["access_token"].as_str().unwrap().to_string()
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Creates an account through the admin endpoint and logs it in.
    /// Returns (user id, token).
    pub async fn create_user(&self, role: &str) -> (i64, String) {
        let email = format!("{}_{}@school.test", role, &uuid::Uuid::new_v4().to_string()[..8]);
        let password = "password123";

        let response = self
            .client
            .post(self.url("/api/auth/users"))
            .bearer_auth(&self.admin_token)
            .json(&json!({
                "email": email,
                "password": password,
                "role": role,
                "full_name": format!("Test {}", role)
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        let id = body["id"].as_i64().unwrap();
        let token = login(&self.client, &self.address, &email, password).await;
        (id, token)
    }

    pub async fn create_class(&self, teacher_token: &str) -> i64 {
        let response = self
            .client
            .post(self.url("/api/classes"))
            .bearer_auth(teacher_token)
            .json(&json!({ "class_name": "Geography 1", "subject": "Geography" }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn enroll(&self, token: &str, class_id: i64, student_id: i64) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/classes/{}/enroll", class_id)))
            .bearer_auth(token)
            .json(&json!({ "student_id": student_id }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates an exam with the given questions. Returns its id.
    pub async fn create_exam(&self, teacher_token: &str, class_id: i64, questions: Value) -> i64 {
        let response = self
            .client
            .post(self.url("/api/exams"))
            .bearer_auth(teacher_token)
            .json(&json!({
                "class_id": class_id,
                "title": "Capitals",
                "description": "World capitals quiz",
                "duration_minutes": 30,
                "total_score": 10,
                "questions": questions
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_i64().unwrap()
    }

    pub async fn set_availability(&self, teacher_token: &str, exam_id: i64, status: &str) -> reqwest::Response {
        self.client
            .patch(self.url(&format!("/api/exams/{}/toggle-availability", exam_id)))
            .bearer_auth(teacher_token)
            .json(&json!({ "availability_status": status }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn submit(&self, student_token: &str, exam_id: i64, answers: Value) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/exams/{}/submit", exam_id)))
            .bearer_auth(student_token)
            .json(&json!({ "answers": answers }))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

impl TestApp {
    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get_json(&self, path: &str, token: &str) -> Value {
        self.get(path, token).await.json().await.unwrap()
    }
}
