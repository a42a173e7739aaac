//! Provider dispatch with fallback.
//!
//! Spotify is queried only when the broker hands back a usable token. A
//! successful Spotify answer is final, even when it has no items. A failed
//! Spotify call, or no usable token at all, falls through to the JioSaavn
//! mirror. Only a failure of that secondary provider is surfaced.

use thiserror::Error;
use tracing::{debug, warn};

use super::broker::{BrokerError, TokenBroker};
use super::saavn::SaavnApi;
use super::track::Track;
use super::ProviderError;
use crate::db::{TrackSource, User};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Failed to fetch recommendations: {0}")]
    UpstreamFailure(#[from] ProviderError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<BrokerError> for DispatchError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::Database(e) => DispatchError::Database(e),
            BrokerError::Provider(e) => DispatchError::UpstreamFailure(e),
            BrokerError::NoRefreshToken => {
                DispatchError::UpstreamFailure(ProviderError::NotConfigured("Spotify refresh token"))
            }
        }
    }
}

/// Tracks plus the provider that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub tracks: Vec<Track>,
    pub source: TrackSource,
}

pub async fn search_tracks(
    broker: &TokenBroker,
    saavn: &dyn SaavnApi,
    user: &User,
    query: &str,
    kind: &str,
    limit: u32,
) -> Result<SearchOutcome, DispatchError> {
    let status = broker.ensure_valid(user).await?;

    if let Some(token) = status.usable_token() {
        match broker.spotify().search(token, query, kind, limit).await {
            Ok(tracks) => {
                debug!(user_id = %user.id, query, count = tracks.len(), "Spotify search succeeded");
                return Ok(SearchOutcome {
                    tracks,
                    source: TrackSource::Spotify,
                });
            }
            Err(e) => {
                warn!(user_id = %user.id, query, error = %e, "Spotify search failed, falling back to JioSaavn");
            }
        }
    } else {
        debug!(user_id = %user.id, status = ?status, "No usable Spotify token, using JioSaavn");
    }

    let tracks = saavn.search_songs(query, limit).await.map_err(|e| {
        warn!(user_id = %user.id, query, error = %e, "JioSaavn search failed");
        DispatchError::UpstreamFailure(e)
    })?;

    Ok(SearchOutcome {
        tracks,
        source: TrackSource::Jiosaavn,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbPool;
    use crate::music::spotify::{ProbeOutcome, SpotifyApi, SpotifyProfile};
    use crate::music::TokenGrant;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn track(title: &str, source: TrackSource) -> Track {
        Track {
            title: title.to_string(),
            artist: "Someone".to_string(),
            album: String::new(),
            spotify_uri: match source {
                TrackSource::Spotify => Some(format!("spotify:track:{title}")),
                TrackSource::Jiosaavn => None,
            },
            url: match source {
                TrackSource::Spotify => None,
                TrackSource::Jiosaavn => Some(format!("https://www.jiosaavn.com/song/{title}")),
            },
            source,
        }
    }

    struct FakeSpotify {
        search: Result<Vec<Track>, u16>,
    }

    #[async_trait]
    impl SpotifyApi for FakeSpotify {
        async fn probe(&self, _access_token: &str) -> Result<ProbeOutcome, ProviderError> {
            Ok(ProbeOutcome::Valid)
        }

        async fn refresh(&self, _refresh_token: &str) -> Result<TokenGrant, ProviderError> {
            Err(ProviderError::Status {
                status: 400,
                body: String::new(),
            })
        }

        async fn exchange_code(&self, _code: &str) -> Result<TokenGrant, ProviderError> {
            unimplemented!()
        }

        async fn profile(&self, _access_token: &str) -> Result<SpotifyProfile, ProviderError> {
            unimplemented!()
        }

        async fn search(
            &self,
            _access_token: &str,
            _query: &str,
            _kind: &str,
            _limit: u32,
        ) -> Result<Vec<Track>, ProviderError> {
            self.search.clone().map_err(|status| ProviderError::Status {
                status,
                body: String::new(),
            })
        }
    }

    struct FakeSaavn {
        result: Result<Vec<Track>, ()>,
        calls: AtomicUsize,
    }

    impl FakeSaavn {
        fn new(result: Result<Vec<Track>, ()>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SaavnApi for FakeSaavn {
        async fn search_songs(&self, _query: &str, _limit: u32) -> Result<Vec<Track>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .map_err(|_| ProviderError::Transport("timed out".to_string()))
        }
    }

    async fn user(db: &DbPool, linked: bool) -> User {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, spotify_access_token) VALUES ('u1', 'a@b.io', 'x', ?)",
        )
        .bind(linked.then_some("token"))
        .execute(db)
        .await
        .unwrap();
        sqlx::query_as("SELECT * FROM users WHERE id = 'u1'")
            .fetch_one(db)
            .await
            .unwrap()
    }

    async fn broker(search: Result<Vec<Track>, u16>) -> (TokenBroker, DbPool) {
        let db = crate::db::init_in_memory().await.unwrap();
        (
            TokenBroker::new(db.clone(), Arc::new(FakeSpotify { search })),
            db,
        )
    }

    #[tokio::test]
    async fn test_unlinked_user_uses_secondary() {
        let (broker, db) = broker(Ok(vec![track("a", TrackSource::Spotify)])).await;
        let user = user(&db, false).await;
        let saavn = FakeSaavn::new(Ok(vec![track("b", TrackSource::Jiosaavn)]));

        let outcome = search_tracks(&broker, &saavn, &user, "happy Hindi", "track", 10)
            .await
            .unwrap();
        assert_eq!(outcome.source, TrackSource::Jiosaavn);
        assert_eq!(outcome.tracks[0].title, "b");
    }

    #[tokio::test]
    async fn test_linked_user_uses_primary() {
        let (broker, db) = broker(Ok(vec![track("a", TrackSource::Spotify)])).await;
        let user = user(&db, true).await;
        let saavn = FakeSaavn::new(Ok(vec![]));

        let outcome = search_tracks(&broker, &saavn, &user, "happy Hindi", "track", 10)
            .await
            .unwrap();
        assert_eq!(outcome.source, TrackSource::Spotify);
        assert_eq!(outcome.tracks.len(), 1);
        assert_eq!(saavn.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_primary_error_falls_back() {
        let (broker, db) = broker(Err(500)).await;
        let user = user(&db, true).await;
        let saavn = FakeSaavn::new(Ok(vec![track("b", TrackSource::Jiosaavn)]));

        let outcome = search_tracks(&broker, &saavn, &user, "calm English", "track", 10)
            .await
            .unwrap();
        assert_eq!(outcome.source, TrackSource::Jiosaavn);
        assert_eq!(saavn.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_primary_result_does_not_fall_back() {
        let (broker, db) = broker(Ok(vec![])).await;
        let user = user(&db, true).await;
        let saavn = FakeSaavn::new(Ok(vec![track("b", TrackSource::Jiosaavn)]));

        let outcome = search_tracks(&broker, &saavn, &user, "obscure", "track", 10)
            .await
            .unwrap();
        assert_eq!(outcome.source, TrackSource::Spotify);
        assert!(outcome.tracks.is_empty());
        assert_eq!(saavn.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_secondary_failure_is_upstream_error() {
        let (broker, db) = broker(Err(503)).await;
        let user = user(&db, true).await;
        let saavn = FakeSaavn::new(Err(()));

        let result = search_tracks(&broker, &saavn, &user, "happy Hindi", "track", 10).await;
        assert!(matches!(result, Err(DispatchError::UpstreamFailure(_))));
    }

    #[tokio::test]
    async fn test_secondary_zero_matches_is_empty_success() {
        let (broker, db) = broker(Ok(vec![])).await;
        let user = user(&db, false).await;
        let saavn = FakeSaavn::new(Ok(vec![]));

        let outcome = search_tracks(&broker, &saavn, &user, "nothing", "track", 10)
            .await
            .unwrap();
        assert_eq!(outcome.source, TrackSource::Jiosaavn);
        assert!(outcome.tracks.is_empty());
    }
}
