use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use super::extract::ValidJson;
use super::songs::validate_song;
use super::validation::validate_playlist_name;
use crate::db::{
    self, CreatePlaylistRequest, CreatePlaylistResponse, MessageResponse, Playlist,
    PlaylistResponse, Song, SongRequest, SongResponse, User,
};
use crate::AppState;

/// Load a playlist owned by `user`. Someone else's playlist is "not found".
async fn owned_playlist(state: &AppState, user: &User, id: &str) -> Result<Playlist, ApiError> {
    sqlx::query_as("SELECT * FROM playlists WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(&user.id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))
}

/// GET /api/playlists
pub async fn list_playlists(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<PlaylistResponse>>, ApiError> {
    let playlists: Vec<Playlist> = sqlx::query_as(
        "SELECT * FROM playlists WHERE user_id = ? ORDER BY created_at ASC, rowid ASC",
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(playlists.into_iter().map(PlaylistResponse::from).collect()))
}

/// POST /api/playlists
pub async fn create_playlist(
    State(state): State<Arc<AppState>>,
    user: User,
    ValidJson(request): ValidJson<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<CreatePlaylistResponse>), ApiError> {
    let name = validate_playlist_name(&request.name)
        .map_err(|e| ApiError::validation_field("name", e))?;

    let id = uuid::Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO playlists (id, user_id, name, description, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&user.id)
    .bind(&name)
    .bind(request.description.unwrap_or_default())
    .bind(db::now())
    .execute(&state.db)
    .await?;

    info!(user_id = %user.id, playlist_id = %id, "Playlist created");

    Ok((
        StatusCode::CREATED,
        Json(CreatePlaylistResponse {
            message: "Playlist created".to_string(),
            playlist_id: id,
        }),
    ))
}

/// DELETE /api/playlists/:id
pub async fn delete_playlist(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let result = sqlx::query("DELETE FROM playlists WHERE id = ? AND user_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Playlist not found"));
    }

    info!(user_id = %user.id, playlist_id = %id, "Playlist deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/playlists/:id/songs
pub async fn list_playlist_songs(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
) -> Result<Json<Vec<SongResponse>>, ApiError> {
    let playlist = owned_playlist(&state, &user, &id).await?;

    let songs: Vec<Song> = sqlx::query_as(
        r#"
        SELECT s.* FROM songs s
        JOIN playlist_songs ps ON ps.song_id = s.id
        WHERE ps.playlist_id = ?
        ORDER BY ps.added_at ASC, ps.rowid ASC
        "#,
    )
    .bind(&playlist.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(songs.into_iter().map(SongResponse::from).collect()))
}

/// Add a song to a playlist. The song row is shared across playlists and
/// keyed by (source, external_id).
///
/// POST /api/playlists/:id/songs
pub async fn add_playlist_song(
    State(state): State<Arc<AppState>>,
    user: User,
    Path(id): Path<String>,
    ValidJson(request): ValidJson<SongRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let playlist = owned_playlist(&state, &user, &id).await?;
    let song = validate_song(&request)?;

    let mut tx = state.db.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO songs (id, source, external_id, title, artist, album, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (source, external_id) DO NOTHING
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(song.source.as_str())
    .bind(song.external_id)
    .bind(song.title)
    .bind(song.artist)
    .bind(song.album)
    .bind(db::now())
    .execute(&mut *tx)
    .await?;

    let (song_id,): (String,) =
        sqlx::query_as("SELECT id FROM songs WHERE source = ? AND external_id = ?")
            .bind(song.source.as_str())
            .bind(song.external_id)
            .fetch_one(&mut *tx)
            .await?;

    let result = sqlx::query(
        r#"
        INSERT INTO playlist_songs (playlist_id, song_id, added_at) VALUES (?, ?, ?)
        ON CONFLICT (playlist_id, song_id) DO NOTHING
        "#,
    )
    .bind(&playlist.id)
    .bind(&song_id)
    .bind(db::now())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    if result.rows_affected() == 0 {
        return Ok((
            StatusCode::OK,
            Json(MessageResponse::new("Song already in playlist")),
        ));
    }

    info!(user_id = %user.id, playlist_id = %playlist.id, song_id = %song_id, "Song added to playlist");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Song added to playlist")),
    ))
}
