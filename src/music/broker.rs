//! Spotify access token lifecycle.
//!
//! Before a user's Spotify token is used, the broker issues one probe
//! request. If Spotify reports the token as expired, the stored refresh
//! token is exchanged exactly once and the new access token is written back
//! to the user row. There are no retries: anything other than a usable
//! token sends the caller down the unauthenticated path.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::spotify::{ProbeOutcome, SpotifyApi};
use super::{ProviderError, TokenGrant};
use crate::db::{DbPool, User};

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("No refresh token found")]
    NoRefreshToken,

    #[error("Failed to refresh token: {0}")]
    Provider(#[from] ProviderError),

    #[error("Failed to store refreshed token: {0}")]
    Database(#[from] sqlx::Error),
}

/// Outcome of [`TokenBroker::ensure_valid`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// The user never linked a Spotify account
    NotLinked,
    /// The stored token was accepted by the probe
    Valid(String),
    /// The stored token had expired and was replaced
    Refreshed(String),
    /// Expired and could not be refreshed; the user has to link again
    ReauthRequired,
    /// The probe could not reach Spotify
    Unavailable,
}

impl TokenStatus {
    /// Bearer token to call Spotify with, if there is one
    pub fn usable_token(&self) -> Option<&str> {
        match self {
            Self::Valid(token) | Self::Refreshed(token) => Some(token),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct TokenBroker {
    db: DbPool,
    spotify: Arc<dyn SpotifyApi>,
}

impl TokenBroker {
    pub fn new(db: DbPool, spotify: Arc<dyn SpotifyApi>) -> Self {
        Self { db, spotify }
    }

    pub fn spotify(&self) -> &dyn SpotifyApi {
        self.spotify.as_ref()
    }

    /// Make sure the user's access token is usable: one probe, at most one
    /// refresh. Only a failure to persist a refreshed token is an error.
    pub async fn ensure_valid(&self, user: &User) -> Result<TokenStatus, BrokerError> {
        let access_token = match user.spotify_access_token.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(TokenStatus::NotLinked),
        };

        match self.spotify.probe(access_token).await {
            Ok(ProbeOutcome::Valid) => return Ok(TokenStatus::Valid(access_token.to_string())),
            Ok(ProbeOutcome::Expired) => {}
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Spotify token probe failed");
                return Ok(TokenStatus::Unavailable);
            }
        }

        match self.refresh(user).await {
            Ok(grant) => Ok(TokenStatus::Refreshed(grant.access_token)),
            Err(BrokerError::Database(e)) => Err(BrokerError::Database(e)),
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Spotify token expired and could not be refreshed");
                Ok(TokenStatus::ReauthRequired)
            }
        }
    }

    /// Exchange the stored refresh token and persist the result.
    pub async fn refresh(&self, user: &User) -> Result<TokenGrant, BrokerError> {
        let refresh_token = user
            .spotify_refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(BrokerError::NoRefreshToken)?;

        let grant = self.spotify.refresh(refresh_token).await?;

        // Spotify may or may not rotate the refresh token; keep the old one otherwise
        sqlx::query(
            "UPDATE users SET spotify_access_token = ?, spotify_refresh_token = COALESCE(?, spotify_refresh_token) WHERE id = ?",
        )
        .bind(&grant.access_token)
        .bind(&grant.refresh_token)
        .bind(&user.id)
        .execute(&self.db)
        .await?;

        info!(user_id = %user.id, "Spotify access token refreshed");
        Ok(grant)
    }
}
