// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, classes, entities::entity_router, exams},
    models::{class::Class, exam::Exam, exam_result::ExamResult, submission::Submission, user::User},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, classes, exams, entities).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool, Config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        // Protected: any signed-in user
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(auth_layer.clone()),
        )
        // Protected: super admin only
        .merge(
            Router::new()
                .route("/users", get(auth::list_users).post(auth::create_user))
                .layer(middleware::from_fn(admin_middleware))
                .layer(auth_layer.clone()),
        );

    let class_routes = Router::new()
        .route("/", get(classes::list_classes).post(classes::create_class))
        .route("/{id}", get(classes::get_class))
        .route("/{id}/enroll", post(classes::enroll_student))
        .route(
            "/{id}/students/{student_id}",
            delete(classes::remove_student),
        )
        .route("/{id}/exams", get(classes::list_class_exams))
        .layer(auth_layer.clone());

    let exam_routes = Router::new()
        .route("/", post(exams::create_exam))
        .route("/{id}", get(exams::get_exam))
        .route("/{id}/toggle-availability", patch(exams::toggle_availability))
        .route("/{id}/submit", post(exams::submit_exam))
        .route("/{id}/submissions", get(exams::list_submissions))
        .layer(auth_layer.clone());

    // Double middleware protection: Auth first, then Admin check
    let entity_routes = Router::new()
        .nest("/users", entity_router::<User>())
        .nest("/classes", entity_router::<Class>())
        .nest("/exams", entity_router::<Exam>())
        .nest("/submissions", entity_router::<Submission>())
        .nest("/results", entity_router::<ExamResult>())
        .layer(middleware::from_fn(admin_middleware))
        .layer(auth_layer);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/classes", class_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/entities", entity_routes)
        // Global Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
