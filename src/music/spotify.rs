//! Spotify Web API and accounts service client.

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::track::{SpotifySearchResponse, Track};
use super::{ensure_success, ProviderError, TokenGrant, TokenResponse};
use crate::config::{Config, OAuthProviderConfig};

pub const SCOPES: &str = "user-read-email playlist-read-private";

/// Result of checking whether a stored access token is still accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Valid,
    Expired,
}

/// Profile of the account a token belongs to (`GET /v1/me`)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SpotifyProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[async_trait]
pub trait SpotifyApi: Send + Sync {
    /// Cheap authenticated call used to detect an expired access token
    async fn probe(&self, access_token: &str) -> Result<ProbeOutcome, ProviderError>;
    /// Exchange a refresh token for a new access token
    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError>;
    /// Exchange an authorization code for a token pair
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ProviderError>;
    async fn profile(&self, access_token: &str) -> Result<SpotifyProfile, ProviderError>;
    async fn search(
        &self,
        access_token: &str,
        query: &str,
        kind: &str,
        limit: u32,
    ) -> Result<Vec<Track>, ProviderError>;
}

/// Redirect URI registered for the Spotify app
pub fn redirect_uri(config: &Config, oauth: &OAuthProviderConfig) -> String {
    oauth.redirect_uri_or(&format!(
        "http://localhost:{}/spotify/callback",
        config.server.api_port
    ))
}

/// Authorization URL the user is sent to when linking an account.
/// `state` carries the MoodTune user id through the round trip.
pub fn authorize_url(config: &Config, state: &str) -> Result<String, ProviderError> {
    let oauth = config
        .oauth
        .spotify
        .as_ref()
        .ok_or(ProviderError::NotConfigured("Spotify OAuth"))?;
    let base = format!(
        "{}/authorize",
        config.providers.spotify_accounts_url.trim_end_matches('/')
    );
    let redirect = redirect_uri(config, oauth);
    let url = Url::parse_with_params(
        &base,
        &[
            ("client_id", oauth.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", redirect.as_str()),
            ("scope", SCOPES),
            ("show_dialog", "true"),
            ("state", state),
        ],
    )
    .map_err(|e| ProviderError::Decode(e.to_string()))?;
    Ok(url.to_string())
}

pub struct SpotifyClient {
    http: reqwest::Client,
    api_url: String,
    accounts_url: String,
    oauth: Option<OAuthProviderConfig>,
    redirect_uri: Option<String>,
}

impl SpotifyClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        let oauth = config.oauth.spotify.clone();
        let redirect_uri = oauth.as_ref().map(|o| redirect_uri(config, o));
        Self {
            http,
            api_url: config
                .providers
                .spotify_api_url
                .trim_end_matches('/')
                .to_string(),
            accounts_url: config
                .providers
                .spotify_accounts_url
                .trim_end_matches('/')
                .to_string(),
            oauth,
            redirect_uri,
        }
    }

    fn credentials(&self) -> Result<&OAuthProviderConfig, ProviderError> {
        self.oauth
            .as_ref()
            .ok_or(ProviderError::NotConfigured("Spotify OAuth"))
    }

    async fn request_token(&self, form: &[(&str, &str)]) -> Result<TokenGrant, ProviderError> {
        let response = self
            .http
            .post(format!("{}/api/token", self.accounts_url))
            .form(form)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let token: TokenResponse = response.json().await?;
        token.into_grant()
    }
}

#[async_trait]
impl SpotifyApi for SpotifyClient {
    async fn probe(&self, access_token: &str) -> Result<ProbeOutcome, ProviderError> {
        let response = self
            .http
            .get(format!("{}/v1/me", self.api_url))
            .bearer_auth(access_token)
            .send()
            .await?;

        // Only an explicit 401 means the token has to be refreshed
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(ProbeOutcome::Expired);
        }
        if !response.status().is_success() {
            debug!(status = %response.status(), "Spotify probe returned non-success status");
        }
        Ok(ProbeOutcome::Valid)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        let oauth = self.credentials()?;
        self.request_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
        ])
        .await
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ProviderError> {
        let oauth = self.credentials()?;
        let redirect = self.redirect_uri.clone().unwrap_or_default();
        self.request_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect.as_str()),
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
        ])
        .await
    }

    async fn profile(&self, access_token: &str) -> Result<SpotifyProfile, ProviderError> {
        let response = self
            .http
            .get(format!("{}/v1/me", self.api_url))
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn search(
        &self,
        access_token: &str,
        query: &str,
        kind: &str,
        limit: u32,
    ) -> Result<Vec<Track>, ProviderError> {
        let limit = limit.to_string();
        let response = self
            .http
            .get(format!("{}/v1/search", self.api_url))
            .bearer_auth(access_token)
            .query(&[("q", query), ("type", kind), ("limit", limit.as_str())])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: SpotifySearchResponse = response.json().await?;
        Ok(body.into_tracks())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> Config {
        let mut config = Config::default();
        config.oauth.spotify = Some(OAuthProviderConfig {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            redirect_uri: None,
        });
        config
    }

    #[test]
    fn test_authorize_url() {
        let url = authorize_url(&configured(), "user-42").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
        assert_eq!(params["client_id"], "client-123");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["redirect_uri"], "http://localhost:5000/spotify/callback");
        assert_eq!(params["scope"], SCOPES);
        assert_eq!(params["show_dialog"], "true");
        assert_eq!(params["state"], "user-42");
    }

    #[test]
    fn test_authorize_url_requires_configuration() {
        assert!(matches!(
            authorize_url(&Config::default(), "u"),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_token_response_without_access_token_is_rejected() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Refresh token revoked"}"#,
        )
        .unwrap();
        let err = token.into_grant().unwrap_err();
        assert!(err.to_string().contains("Refresh token revoked"));
    }

    #[test]
    fn test_token_response_keeps_optional_refresh_token() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"new","token_type":"Bearer","expires_in":3600}"#)
                .unwrap();
        assert_eq!(
            token.into_grant().unwrap(),
            TokenGrant {
                access_token: "new".to_string(),
                refresh_token: None
            }
        );
    }

    #[tokio::test]
    async fn test_refresh_without_credentials_fails_before_network() {
        let client = SpotifyClient::new(&Config::default(), reqwest::Client::new());
        assert!(matches!(
            client.refresh("r").await,
            Err(ProviderError::NotConfigured(_))
        ));
    }
}
