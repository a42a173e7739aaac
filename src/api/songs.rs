use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::ValidJson;
use super::validation::{given, require_given, validate_source};
use crate::db::{
    self, LikedSong, MessageResponse, SongHistory, SongKeyRequest, SongRequest, SongResponse,
    TrackSource, User,
};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HistoryRecordedResponse {
    pub message: String,
    pub id: String,
}

/// A fully validated track reference
#[derive(Debug)]
pub(crate) struct SongRef<'a> {
    pub source: TrackSource,
    pub external_id: &'a str,
    pub title: &'a str,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
}

/// Check source, external_id and title together, reporting every problem
pub(crate) fn validate_song(request: &SongRequest) -> Result<SongRef<'_>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    let source = validate_source(&request.source)
        .map_err(|e| errors.add("source", e))
        .ok();
    let external_id = require_given(&request.external_id, "external_id")
        .map_err(|e| errors.add("external_id", e))
        .ok();
    let title = require_given(&request.title, "title")
        .map_err(|e| errors.add("title", e))
        .ok();
    errors.finish()?;

    match (source, external_id, title) {
        (Some(source), Some(external_id), Some(title)) => Ok(SongRef {
            source,
            external_id,
            title,
            artist: given(&request.artist),
            album: given(&request.album),
        }),
        _ => Err(ApiError::bad_request("source, external_id and title are required")),
    }
}

/// Like a song. Liking it again is a no-op.
///
/// POST /api/songs/like
pub async fn like_song(
    State(state): State<Arc<AppState>>,
    user: User,
    ValidJson(request): ValidJson<SongRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let song = validate_song(&request)?;

    let result = sqlx::query(
        r#"
        INSERT INTO liked_songs (id, user_id, source, external_id, title, artist, album, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (user_id, source, external_id) DO NOTHING
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&user.id)
    .bind(song.source.as_str())
    .bind(song.external_id)
    .bind(song.title)
    .bind(song.artist)
    .bind(song.album)
    .bind(db::now())
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Ok((StatusCode::OK, Json(MessageResponse::new("Song already liked"))));
    }

    info!(user_id = %user.id, source = %song.source, external_id = song.external_id, "Song liked");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Song liked successfully")),
    ))
}

/// DELETE /api/songs/like
pub async fn unlike_song(
    State(state): State<Arc<AppState>>,
    user: User,
    ValidJson(request): ValidJson<SongKeyRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    let source = validate_source(&request.source)
        .map_err(|e| errors.add("source", e))
        .ok();
    let external_id = require_given(&request.external_id, "external_id")
        .map_err(|e| errors.add("external_id", e))
        .ok();
    errors.finish()?;
    let (Some(source), Some(external_id)) = (source, external_id) else {
        return Err(ApiError::bad_request("source and external_id are required"));
    };

    let result = sqlx::query(
        "DELETE FROM liked_songs WHERE user_id = ? AND source = ? AND external_id = ?",
    )
    .bind(&user.id)
    .bind(source.as_str())
    .bind(external_id)
    .execute(&state.db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Song not found in liked songs"));
    }

    info!(user_id = %user.id, source = %source, external_id, "Song unliked");
    Ok(Json(MessageResponse::new("Song unliked successfully")))
}

/// GET /api/liked-songs
pub async fn liked_songs(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<SongResponse>>, ApiError> {
    let songs: Vec<LikedSong> = sqlx::query_as(
        "SELECT * FROM liked_songs WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(songs.into_iter().map(SongResponse::from).collect()))
}

/// GET /api/song-history
pub async fn song_history(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<SongResponse>>, ApiError> {
    let history: Vec<SongHistory> = sqlx::query_as(
        "SELECT * FROM song_history WHERE user_id = ? ORDER BY played_at DESC, rowid DESC",
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(history.into_iter().map(SongResponse::from).collect()))
}

/// Record that a song was played. Only the source is mandatory.
///
/// POST /api/song-history
pub async fn record_play(
    State(state): State<Arc<AppState>>,
    user: User,
    ValidJson(request): ValidJson<SongRequest>,
) -> Result<(StatusCode, Json<HistoryRecordedResponse>), ApiError> {
    let source = validate_source(&request.source).map_err(|e| ApiError::validation_field("source", e))?;

    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO song_history (id, user_id, source, external_id, title, artist, album, played_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&user.id)
    .bind(source.as_str())
    .bind(given(&request.external_id))
    .bind(given(&request.title))
    .bind(given(&request.artist))
    .bind(given(&request.album))
    .bind(db::now())
    .execute(&state.db)
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(HistoryRecordedResponse {
            message: "Song play recorded".to_string(),
            id,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: Option<&str>, external_id: Option<&str>, title: Option<&str>) -> SongRequest {
        SongRequest {
            source: source.map(String::from),
            external_id: external_id.map(String::from),
            title: title.map(String::from),
            artist: Some(String::new()),
            album: None,
        }
    }

    #[test]
    fn test_validate_song() {
        let req = request(Some("Spotify"), Some("spotify:track:1"), Some("Song"));
        let song = validate_song(&req).unwrap();
        assert_eq!(song.source, TrackSource::Spotify);
        assert_eq!(song.artist, None);

        let err = validate_song(&request(Some("tidal"), None, Some("x"))).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.message().contains("2 fields"));
    }
}
