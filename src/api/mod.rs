pub mod auth;
mod controls;
mod emotions;
pub mod error;
pub mod extract;
mod google;
mod playlists;
mod recommendations;
mod songs;
mod spotify;
mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::Config;
use crate::db::MessageResponse;
use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Public routes: credentials and OAuth redirect targets
    let public_routes = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/spotify/callback", get(spotify::callback))
        .route("/auth/google/callback", get(google::callback));

    // Session-protected routes outside /api, kept for frontend compatibility
    let legacy_routes = Router::new()
        .route("/log_emotion", post(emotions::log_emotion))
        .route("/spotify/login", get(spotify::login))
        .route("/spotify/callback/complete", post(spotify::complete))
        .route("/spotify/refresh_token", post(spotify::refresh_token))
        .route("/auth/google/callback/complete", post(google::complete));

    // Every handler here takes the `User` extractor, which rejects
    // requests without a valid session
    let api_routes = Router::new()
        // Identity
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout))
        // Account linking
        .route("/spotify/login-url", get(spotify::login_url))
        .route("/google/login-url", get(google::login_url))
        // Emotions
        .route("/emotions", get(emotions::list_emotions))
        .route("/detect-emotion", post(emotions::detect_emotion))
        // Recommendations
        .route("/recommendations", get(recommendations::recommendations))
        .route("/search", get(recommendations::search))
        // Likes and history
        .route(
            "/songs/like",
            post(songs::like_song).delete(songs::unlike_song),
        )
        .route("/liked-songs", get(songs::liked_songs))
        .route(
            "/song-history",
            get(songs::song_history).post(songs::record_play),
        )
        // Playlists
        .route(
            "/playlists",
            get(playlists::list_playlists).post(playlists::create_playlist),
        )
        .route(
            "/playlists/:id",
            axum::routing::delete(playlists::delete_playlist),
        )
        .route(
            "/playlists/:id/songs",
            get(playlists::list_playlist_songs).post(playlists::add_playlist_song),
        )
        // Controls
        .route("/gestures/map", post(controls::map_gesture))
        .route("/voice/command", post(controls::voice_command));

    Router::new()
        .merge(public_routes)
        .merge(legacy_routes)
        .nest("/api", api_routes)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn index() -> Json<MessageResponse> {
    Json(MessageResponse::new("Mood-Based Music API is live!"))
}

async fn health_check() -> &'static str {
    "OK"
}
