// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempts, auth, quizzes},
    state::AppState,
    utils::jwt::{auth_middleware, student_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, quizzes, attempts).
/// * Applies global middleware (Trace, CORS, body limit).
/// * Injects global state (storage, AI client, config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
        "http://localhost:5173".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    // Middleware runs bottom-up: Auth first, then the role check.
    let teacher_quiz_routes = Router::new()
        .route("/", post(quizzes::generate_quiz).get(quizzes::list_quizzes))
        .route("/{id}", get(quizzes::get_quiz))
        .route("/{id}/attempts", get(quizzes::get_quiz_attempts))
        .layer(middleware::from_fn(teacher_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let student_quiz_routes = Router::new()
        .route("/code/{code}", get(quizzes::get_quiz_by_code))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let attempt_routes = Router::new()
        .route("/", post(attempts::submit_attempt).get(attempts::list_attempts))
        .route("/{id}", get(attempts::get_attempt))
        .layer(middleware::from_fn(student_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let max_body_bytes = state.config.max_body_bytes;

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/quizzes", teacher_quiz_routes.merge(student_quiz_routes))
        .nest("/api/attempts", attempt_routes)
        // Global Middleware (applied from outside in)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
