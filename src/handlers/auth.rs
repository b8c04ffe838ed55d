// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, ErrorBody},
    extractors::AppJson,
    models::user::{LoginRequest, RegisterRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::{Role, TokenSubject, sign_jwt},
    },
};

const USER_COLUMNS: &str = "id, username, password, display_name, role, subject, created_at";

/// Usernames are stored and looked up trimmed.
fn normalize_username(raw: &str) -> &str {
    raw.trim()
}

/// Registers a new teacher or student.
///
/// Hashes the password using Argon2 before storing it.
/// Teachers must name the subject they contribute to.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created"),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 409, description = "Username taken", body = ErrorBody),
    )
)]
pub async fn register(
    State(pool): State<PgPool>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let username = normalize_username(&payload.username);
    if username.chars().count() < 3 {
        return Err(AppError::BadRequest(
            "Username length must be between 3 and 50 characters.".to_string(),
        ));
    }

    let role: Role = payload.role.parse()?;
    let subject = match role {
        Role::Host => {
            return Err(AppError::BadRequest(
                "Host accounts cannot be self-registered".to_string(),
            ));
        }
        Role::Teacher => Some(
            payload
                .subject
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::BadRequest("Teachers must specify a subject".to_string()))?
                .to_string(),
        ),
        Role::Student => None,
    };

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (username, password, display_name, role, subject) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(username)
    .bind(&hashed_password)
    .bind(payload.display_name.trim())
    .bind(role.as_str())
    .bind(&subject)
    .fetch_one(&pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("Username '{}' already exists", username))
        }
        _ => {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        }
    })?;

    tracing::info!(user_id = user.id, role = %role, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// The token carries the role, display name and (for teachers) subject, so
/// downstream handlers never re-read the account.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued"),
        (status = 401, description = "Bad credentials", body = ErrorBody),
    )
)]
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(normalize_username(&payload.username))
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let user = user.ok_or(AppError::AuthError("Invalid username or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid username or password".to_string()));
    }

    let role: Role = user
        .role
        .parse()
        .map_err(|_| AppError::InternalServerError(format!("user {} has role '{}'", user.id, user.role)))?;

    let token = sign_jwt(
        TokenSubject {
            id: user.id,
            role,
            display_name: &user.display_name,
            subject: user.subject.as_deref(),
        },
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "role": role,
        "display_name": user.display_name,
        "subject": user.subject,
    })))
}

/// Creates the host account from `ADMIN_USERNAME`/`ADMIN_PASSWORD` if absent.
pub async fn seed_host_user(pool: &PgPool, config: &Config) -> Result<(), AppError> {
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    if existing.is_none() {
        tracing::info!("Seeding host user: {}", username);
        let hashed_password = hash_password(password)?;

        sqlx::query(
            "INSERT INTO users (username, password, display_name, role) VALUES ($1, $2, $3, 'host')",
        )
        .bind(username)
        .bind(hashed_password)
        .bind(username)
        .execute(pool)
        .await?;
        tracing::info!("Host user created successfully.");
    }
    Ok(())
}
