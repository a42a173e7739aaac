pub mod api;
pub mod config;
pub mod db;
pub mod music;

pub use db::DbPool;

use config::Config;
use std::sync::Arc;

use crate::music::{
    EmotionClassifier, GoogleApi, GoogleClient, HttpEmotionClassifier, SaavnApi, SaavnClient,
    SpotifyApi, SpotifyClient, TokenBroker,
};

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub spotify: Arc<dyn SpotifyApi>,
    pub saavn: Arc<dyn SaavnApi>,
    pub google: Arc<dyn GoogleApi>,
    /// Absent when no inference endpoint is configured
    pub classifier: Option<Arc<dyn EmotionClassifier>>,
    pub broker: TokenBroker,
}

impl AppState {
    /// Build the state with the real HTTP provider clients.
    pub fn new(config: Config, db: DbPool) -> Self {
        let http = music::http_client(config.providers.timeout());
        let spotify: Arc<dyn SpotifyApi> = Arc::new(SpotifyClient::new(&config, http.clone()));
        let saavn: Arc<dyn SaavnApi> = Arc::new(SaavnClient::new(&config, http.clone()));
        let google: Arc<dyn GoogleApi> = Arc::new(GoogleClient::new(&config, http.clone()));
        let classifier = config.classifier.endpoint.clone().map(|endpoint| {
            Arc::new(HttpEmotionClassifier::new(endpoint, http)) as Arc<dyn EmotionClassifier>
        });

        Self::with_providers(config, db, spotify, saavn, google, classifier)
    }

    /// Build the state around explicit provider implementations
    pub fn with_providers(
        config: Config,
        db: DbPool,
        spotify: Arc<dyn SpotifyApi>,
        saavn: Arc<dyn SaavnApi>,
        google: Arc<dyn GoogleApi>,
        classifier: Option<Arc<dyn EmotionClassifier>>,
    ) -> Self {
        let broker = TokenBroker::new(db.clone(), spotify.clone());
        Self {
            config,
            db,
            spotify,
            saavn,
            google,
            classifier,
            broker,
        }
    }
}
