//! Spotify account linking.
//!
//! The browser is sent to Spotify with the user id as `state`. Spotify
//! redirects back to `/spotify/callback`, which hands the code to the
//! frontend. The frontend then posts it to `/spotify/callback/complete`
//! with its bearer token, where the code is exchanged and the tokens and
//! profile are stored on the user row.

use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::ApiError;
use super::extract::ValidJson;
use super::validation::require;
use crate::db::{MessageResponse, SpotifyUserResponse, User};
use crate::music::{spotify, ProviderError};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct LoginUrlResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompleteLinkRequest {
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpotifyLinkedResponse {
    pub message: String,
    pub spotify_user: SpotifyUserResponse,
}

/// Frontend URL with one extra query parameter
pub(crate) fn frontend_redirect(frontend_url: &str, key: &str, value: &str) -> Result<String, ApiError> {
    let url = Url::parse_with_params(frontend_url, &[(key, value)])
        .map_err(|e| ApiError::internal(format!("Invalid frontend URL: {}", e)))?;
    Ok(url.to_string())
}

/// GET /api/spotify/login-url
pub async fn login_url(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<LoginUrlResponse>, ApiError> {
    let url = spotify::authorize_url(&state.config, &user.id)?;
    Ok(Json(LoginUrlResponse { url }))
}

/// GET /spotify/login
pub async fn login(State(state): State<Arc<AppState>>, user: User) -> Result<Redirect, ApiError> {
    let url = spotify::authorize_url(&state.config, &user.id)?;
    Ok(Redirect::to(&url))
}

/// OAuth redirect target; forwards the code to the frontend
///
/// GET /spotify/callback
pub async fn callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, ApiError> {
    let code = require(&query.code, "code")
        .map_err(|_| ApiError::bad_request("Missing code in callback"))?;
    let target = frontend_redirect(&state.config.server.frontend_url, "spotify_code", code)?;
    Ok(Redirect::to(&target))
}

/// POST /spotify/callback/complete
pub async fn complete(
    State(state): State<Arc<AppState>>,
    user: User,
    ValidJson(request): ValidJson<CompleteLinkRequest>,
) -> Result<Json<SpotifyLinkedResponse>, ApiError> {
    let code = require(&request.code, "code").map_err(|_| ApiError::bad_request("Missing code"))?;

    let grant = state.spotify.exchange_code(code).await.map_err(|e| match e {
        ProviderError::NotConfigured(_) => ApiError::from(e),
        other => {
            warn!(user_id = %user.id, error = %other, "Spotify code exchange failed");
            ApiError::bad_request("Failed to get access token")
        }
    })?;

    let profile = state.spotify.profile(&grant.access_token).await?;

    sqlx::query(
        r#"
        UPDATE users SET
            spotify_id = ?,
            spotify_display_name = ?,
            spotify_email = ?,
            spotify_access_token = ?,
            spotify_refresh_token = ?
        WHERE id = ?
        "#,
    )
    .bind(&profile.id)
    .bind(&profile.display_name)
    .bind(&profile.email)
    .bind(&grant.access_token)
    .bind(&grant.refresh_token)
    .bind(&user.id)
    .execute(&state.db)
    .await?;

    info!(user_id = %user.id, spotify_id = ?profile.id, "Spotify account linked");

    Ok(Json(SpotifyLinkedResponse {
        message: "Spotify account linked successfully".to_string(),
        spotify_user: SpotifyUserResponse {
            id: profile.id,
            name: profile.display_name,
            email: profile.email,
        },
    }))
}

/// POST /spotify/refresh_token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<MessageResponse>, ApiError> {
    state.broker.refresh(&user).await?;
    Ok(Json(MessageResponse::new("Spotify token refreshed successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontend_redirect() {
        assert_eq!(
            frontend_redirect("http://localhost:3000", "spotify_code", "abc").unwrap(),
            "http://localhost:3000/?spotify_code=abc"
        );
        assert_eq!(
            frontend_redirect("https://app.moodtune.io/link", "google_code", "a b").unwrap(),
            "https://app.moodtune.io/link?google_code=a+b"
        );
        assert!(frontend_redirect("not a url", "k", "v").is_err());
    }
}
