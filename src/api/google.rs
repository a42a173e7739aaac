//! Google account linking, same round trip as Spotify.

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::error::ApiError;
use super::extract::ValidJson;
use super::spotify::{frontend_redirect, CallbackQuery, CompleteLinkRequest, LoginUrlResponse};
use super::validation::require;
use crate::db::{GoogleUserResponse, User};
use crate::music::{google, ProviderError};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct GoogleLinkedResponse {
    pub message: String,
    pub google_user: GoogleUserResponse,
}

/// GET /api/google/login-url
pub async fn login_url(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<LoginUrlResponse>, ApiError> {
    let url = google::authorize_url(&state.config, &user.id)?;
    Ok(Json(LoginUrlResponse { url }))
}

/// GET /auth/google/callback
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, ApiError> {
    let code = require(&query.code, "code")
        .map_err(|_| ApiError::bad_request("Missing code in callback"))?;
    let target = frontend_redirect(&state.config.server.frontend_url, "google_code", code)?;
    Ok(Redirect::to(&target))
}

/// POST /auth/google/callback/complete
pub async fn complete(
    State(state): State<Arc<AppState>>,
    user: User,
    ValidJson(request): ValidJson<CompleteLinkRequest>,
) -> Result<Json<GoogleLinkedResponse>, ApiError> {
    let code = require(&request.code, "code").map_err(|_| ApiError::bad_request("Missing code"))?;

    let grant = state.google.exchange_code(code).await.map_err(|e| match e {
        ProviderError::NotConfigured(_) => ApiError::from(e),
        other => {
            warn!(user_id = %user.id, error = %other, "Google code exchange failed");
            ApiError::bad_request("Failed to get access token")
        }
    })?;

    let profile = state.google.profile(&grant.access_token).await?;

    sqlx::query(
        r#"
        UPDATE users SET
            google_id = ?,
            google_email = ?,
            google_name = ?,
            google_access_token = ?,
            google_refresh_token = COALESCE(?, google_refresh_token)
        WHERE id = ?
        "#,
    )
    .bind(&profile.sub)
    .bind(&profile.email)
    .bind(&profile.name)
    .bind(&grant.access_token)
    .bind(&grant.refresh_token)
    .bind(&user.id)
    .execute(&state.db)
    .await?;

    info!(user_id = %user.id, "Google account linked");

    Ok(Json(GoogleLinkedResponse {
        message: "Google account linked successfully".to_string(),
        google_user: GoogleUserResponse {
            id: profile.sub,
            name: profile.name,
            email: profile.email,
        },
    }))
}
