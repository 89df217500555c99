// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{CreateUserRequest, LoginRequest, Role},
    state::AppState,
    store::StoreError,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new student or teacher.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = state
        .store
        .create_user(&payload.username, &hashed_password, payload.role)
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => {
                AppError::Conflict(format!("Username '{}' already exists", payload.username))
            }
            other => {
                tracing::error!("Failed to register user: {:?}", other);
                AppError::from(other)
            }
        })?;

    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the username and password against the database.
/// If valid, signs a JWT token with the user's ID and role.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .store
        .find_user_by_username(&payload.username)
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::from(e)
        })?;

    // Same message for unknown users and wrong passwords.
    let user = user.ok_or(AppError::AuthError("Invalid username or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid username or password".to_string()));
    }

    let role: Role = user
        .role
        .parse()
        .map_err(AppError::InternalServerError)?;

    let token = sign_jwt(
        user.id,
        role,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": role,
    })))
}
