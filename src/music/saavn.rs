//! Unauthenticated JioSaavn mirror used as the fallback search provider.

use async_trait::async_trait;

use super::track::{SaavnSearchResponse, Track};
use super::{ensure_success, ProviderError};
use crate::config::Config;

#[async_trait]
pub trait SaavnApi: Send + Sync {
    async fn search_songs(&self, query: &str, limit: u32) -> Result<Vec<Track>, ProviderError>;
}

pub struct SaavnClient {
    http: reqwest::Client,
    api_url: String,
}

impl SaavnClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: config
                .providers
                .saavn_api_url
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl SaavnApi for SaavnClient {
    async fn search_songs(&self, query: &str, limit: u32) -> Result<Vec<Track>, ProviderError> {
        let limit = limit.to_string();
        let response = self
            .http
            .get(format!("{}/api/search/songs", self.api_url))
            .query(&[("query", query), ("limit", limit.as_str())])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: SaavnSearchResponse = response.json().await?;
        Ok(body.into_tracks())
    }
}
