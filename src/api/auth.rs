use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::ValidJson;
use super::validation::{require, require_given, validate_email, validate_password};
use crate::db::{self, CredentialsRequest, LoginResponse, MessageResponse, User, UserResponse};
use crate::AppState;

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// 32 random bytes, hex encoded
fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    hex::encode(bytes)
}

/// Only this digest of a session token is ever stored
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn validate_credentials(request: &CredentialsRequest) -> Result<(String, String), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    let email = validate_email(&request.email)
        .map_err(|e| errors.add("email", e))
        .ok();
    let password = validate_password(&request.password)
        .map_err(|e| errors.add("password", e))
        .ok();
    errors.finish()?;

    match (email, password) {
        (Some(email), Some(password)) => Ok((email, password)),
        _ => Err(ApiError::bad_request("Email and password required")),
    }
}

/// Login only needs both fields present; an unknown identity of any shape
/// is rejected later as invalid credentials.
fn login_credentials(request: &CredentialsRequest) -> Result<(String, &str), ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    let email = require(&request.email, "Email")
        .map_err(|e| errors.add("email", e))
        .ok();
    let password = require_given(&request.password, "Password")
        .map_err(|e| errors.add("password", e))
        .ok();
    errors.finish()?;

    match (email, password) {
        (Some(email), Some(password)) => Ok((email.to_lowercase(), password)),
        _ => Err(ApiError::bad_request("Email and password required")),
    }
}

/// Expiry timestamp of a session created now
fn session_expiry(ttl_days: i64) -> Result<String, ApiError> {
    let expires_at = chrono::TimeDelta::try_days(ttl_days)
        .filter(|ttl| *ttl > chrono::TimeDelta::zero())
        .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| ApiError::internal("Invalid session lifetime"))?;
    Ok(expires_at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
}

/// Register a new account
///
/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let (email, password) = validate_credentials(&request)?;

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::conflict("User already exists"));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash = hash_password(&password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    // A concurrent registration of the same email surfaces as a conflict
    // through the UNIQUE constraint
    sqlx::query("INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(&email)
        .bind(&password_hash)
        .bind(db::now())
        .execute(&state.db)
        .await?;

    info!(user_id = %id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered successfully")),
    ))
}

/// Exchange credentials for a bearer token
///
/// POST /login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(request): ValidJson<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (email, password) = login_credentials(&request)?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = generate_token();
    let token_hash = hash_token(&token);

    let expires_at = session_expiry(state.config.auth.session_ttl_days)?;

    let session_id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO sessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&session_id)
    .bind(&user.id)
    .bind(&token_hash)
    .bind(&expires_at)
    .bind(db::now())
    .execute(&state.db)
    .await?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse { token }))
}

/// End the current session
///
/// POST /api/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: User,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    if let Some(token) = extract_token(&headers) {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ? AND user_id = ?")
            .bind(hash_token(token))
            .bind(&user.id)
            .execute(&state.db)
            .await?;
    }
    info!(user_id = %user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/me
pub async fn me(user: User) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Resolve a bearer token to its user. Expired sessions are rejected.
pub async fn get_current_user(pool: &db::DbPool, token: &str) -> Result<User, ApiError> {
    let user: Option<User> = sqlx::query_as(
        r#"
        SELECT u.* FROM users u
        JOIN sessions s ON s.user_id = u.id
        WHERE s.token_hash = ? AND s.expires_at > ?
        "#,
    )
    .bind(hash_token(token))
    .bind(db::now())
    .fetch_optional(pool)
    .await?;

    user.ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))
}

/// Extractor for the authenticated user of a request
#[async_trait]
impl FromRequestParts<Arc<AppState>> for User {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
        get_current_user(&state.db, token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_password_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("anything", "not-a-hash"));
    }

    #[test]
    fn test_tokens_are_random_and_hashed() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert_ne!(hash_token(&a), a);
        assert_eq!(hash_token(&a), hash_token(&a));
    }

    #[test]
    fn test_extract_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_token(&headers), None);

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_token(&headers), Some("abc123"));
    }

    #[test]
    fn test_session_expiry_bounds() {
        assert_eq!(session_expiry(7).unwrap().len(), 27);
        for days in [0, -1, i64::MAX / 1000, i64::MIN] {
            let err = session_expiry(days).unwrap_err();
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_login_credentials_skip_email_format() {
        let request = CredentialsRequest {
            email: Some(" Nobody ".to_string()),
            password: Some(" pw ".to_string()),
        };
        assert_eq!(
            login_credentials(&request).unwrap(),
            ("nobody".to_string(), " pw ")
        );

        let missing = CredentialsRequest {
            email: None,
            password: Some(String::new()),
        };
        let err = login_credentials(&missing).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let pool = db::init_in_memory().await.unwrap();
        sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ('u1', 'a@b.io', 'x')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES ('s1', 'u1', ?, '2000-01-01T00:00:00.000000Z')",
        )
        .bind(hash_token("old"))
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, expires_at) VALUES ('s2', 'u1', ?, '2999-01-01T00:00:00.000000Z')",
        )
        .bind(hash_token("fresh"))
        .execute(&pool)
        .await
        .unwrap();

        let err = get_current_user(&pool, "old").await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(get_current_user(&pool, "fresh").await.unwrap().id, "u1");
    }
}
