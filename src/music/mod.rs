//! Music provider integration.
//!
//! Clients for the external services MoodTune talks to (Spotify, the
//! JioSaavn mirror, Google OAuth and the facial emotion classifier), the
//! Spotify token broker, and the pure recommendation logic: emotion to
//! query mapping and voice command interpretation.

pub mod broker;
pub mod classifier;
pub mod dispatch;
pub mod google;
pub mod query;
pub mod saavn;
pub mod spotify;
pub mod track;
pub mod voice;

pub use broker::{TokenBroker, TokenStatus};
pub use classifier::{EmotionClassifier, EmotionDetection, HttpEmotionClassifier};
pub use dispatch::{search_tracks, DispatchError, SearchOutcome};
pub use google::{GoogleApi, GoogleClient, GoogleProfile};
pub use query::{build_query, resolve_language, LanguagePrompt, QueryError};
pub use saavn::{SaavnApi, SaavnClient};
pub use spotify::{ProbeOutcome, SpotifyApi, SpotifyClient, SpotifyProfile};
pub use track::{RecommendedTrack, Track};
pub use voice::{interpret, VoiceAction};

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by outbound provider calls
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("provider answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

/// Token pair returned by an OAuth token endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    /// Only present when the provider rotates or issues a refresh token
    pub refresh_token: Option<String>,
}

/// Response of an OAuth token endpoint
#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl TokenResponse {
    pub fn into_grant(self) -> Result<TokenGrant, ProviderError> {
        match self.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => Ok(TokenGrant {
                access_token,
                refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            }),
            None => Err(ProviderError::Decode(format!(
                "no access token in response ({})",
                self.error_description
                    .or(self.error)
                    .unwrap_or_else(|| "no error given".to_string())
            ))),
        }
    }
}

/// Build the shared outbound HTTP client with a bounded per-request timeout.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .user_agent(concat!("MoodTune/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Reject non-success responses, keeping the body for diagnostics.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        body,
    })
}
