//! User, linked provider identity and session models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub spotify_id: Option<String>,
    pub spotify_display_name: Option<String>,
    pub spotify_email: Option<String>,
    #[serde(skip_serializing)]
    pub spotify_access_token: Option<String>,
    #[serde(skip_serializing)]
    pub spotify_refresh_token: Option<String>,
    pub google_id: Option<String>,
    pub google_email: Option<String>,
    pub google_name: Option<String>,
    #[serde(skip_serializing)]
    pub google_access_token: Option<String>,
    #[serde(skip_serializing)]
    pub google_refresh_token: Option<String>,
    pub created_at: String,
}

impl User {
    pub fn spotify_linked(&self) -> bool {
        self.spotify_access_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    pub fn google_linked(&self) -> bool {
        self.google_access_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }
}

/// Public view of a linked Spotify account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpotifyUserResponse {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Public view of a linked Google account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GoogleUserResponse {
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Response DTO for `/api/me`; never carries tokens or the password hash
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub spotify_linked: bool,
    pub spotify_user: Option<SpotifyUserResponse>,
    pub google_linked: bool,
    pub google_user: Option<GoogleUserResponse>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        let spotify_linked = user.spotify_linked();
        let google_linked = user.google_linked();
        Self {
            spotify_user: spotify_linked.then(|| SpotifyUserResponse {
                id: user.spotify_id.clone(),
                name: user.spotify_display_name.clone(),
                email: user.spotify_email.clone(),
            }),
            google_user: google_linked.then(|| GoogleUserResponse {
                id: user.google_id.clone(),
                name: user.google_name.clone(),
                email: user.google_email.clone(),
            }),
            id: user.id,
            email: user.email,
            spotify_linked,
            google_linked,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}
