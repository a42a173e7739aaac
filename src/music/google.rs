//! Google OAuth client used to link a Google identity to an account.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use super::{ensure_success, ProviderError, TokenGrant, TokenResponse};
use crate::config::{Config, OAuthProviderConfig};

pub const SCOPES: &str = "openid email profile";

/// OpenID Connect userinfo
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GoogleProfile {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[async_trait]
pub trait GoogleApi: Send + Sync {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ProviderError>;
    async fn profile(&self, access_token: &str) -> Result<GoogleProfile, ProviderError>;
}

pub fn redirect_uri(config: &Config, oauth: &OAuthProviderConfig) -> String {
    oauth.redirect_uri_or(&format!(
        "http://localhost:{}/auth/google/callback",
        config.server.api_port
    ))
}

pub fn authorize_url(config: &Config, state: &str) -> Result<String, ProviderError> {
    let oauth = config
        .oauth
        .google
        .as_ref()
        .ok_or(ProviderError::NotConfigured("Google OAuth"))?;
    let redirect = redirect_uri(config, oauth);
    let url = Url::parse_with_params(
        &config.providers.google_auth_url,
        &[
            ("client_id", oauth.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", redirect.as_str()),
            ("scope", SCOPES),
            ("access_type", "offline"),
            ("prompt", "select_account"),
            ("state", state),
        ],
    )
    .map_err(|e| ProviderError::Decode(e.to_string()))?;
    Ok(url.to_string())
}

pub struct GoogleClient {
    http: reqwest::Client,
    token_url: String,
    userinfo_url: String,
    oauth: Option<OAuthProviderConfig>,
    redirect_uri: Option<String>,
}

impl GoogleClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        let oauth = config.oauth.google.clone();
        let redirect_uri = oauth.as_ref().map(|o| redirect_uri(config, o));
        Self {
            http,
            token_url: config.providers.google_token_url.clone(),
            userinfo_url: config.providers.google_userinfo_url.clone(),
            oauth,
            redirect_uri,
        }
    }
}

#[async_trait]
impl GoogleApi for GoogleClient {
    async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ProviderError> {
        let oauth = self
            .oauth
            .as_ref()
            .ok_or(ProviderError::NotConfigured("Google OAuth"))?;
        let redirect = self.redirect_uri.clone().unwrap_or_default();
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect.as_str()),
                ("client_id", oauth.client_id.as_str()),
                ("client_secret", oauth.client_secret.as_str()),
            ])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let token: TokenResponse = response.json().await?;
        token.into_grant()
    }

    async fn profile(&self, access_token: &str) -> Result<GoogleProfile, ProviderError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_url_requests_offline_access() {
        let mut config = Config::default();
        config.oauth.google = Some(OAuthProviderConfig {
            client_id: "gid".to_string(),
            client_secret: "gsecret".to_string(),
            redirect_uri: Some("https://moodtune.example/auth/google/callback".to_string()),
        });

        let url = authorize_url(&config, "u-7").unwrap();
        let parsed = Url::parse(&url).unwrap();
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();

        assert_eq!(params["access_type"], "offline");
        assert_eq!(params["scope"], SCOPES);
        assert_eq!(params["redirect_uri"], "https://moodtune.example/auth/google/callback");
        assert_eq!(params["state"], "u-7");
    }
}
