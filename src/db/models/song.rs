//! Song, liked song and play history models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Provider a track reference belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TrackSource {
    Spotify,
    Jiosaavn,
}

impl TrackSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spotify => "spotify",
            Self::Jiosaavn => "jiosaavn",
        }
    }
}

impl std::fmt::Display for TrackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TrackSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spotify" => Ok(Self::Spotify),
            "jiosaavn" => Ok(Self::Jiosaavn),
            _ => Err(format!("Unknown source: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Song {
    pub id: String,
    pub source: String,
    pub external_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LikedSong {
    pub id: String,
    pub user_id: String,
    pub source: String,
    pub external_id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SongHistory {
    pub id: String,
    pub user_id: String,
    pub source: String,
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub played_at: String,
}

/// Track reference as sent by clients for like, history and playlist calls
#[derive(Debug, Clone, Deserialize)]
pub struct SongRequest {
    pub source: Option<String>,
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

/// Key of a liked song, used by unlike
#[derive(Debug, Clone, Deserialize)]
pub struct SongKeyRequest {
    pub source: Option<String>,
    pub external_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SongResponse {
    pub source: String,
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

impl From<LikedSong> for SongResponse {
    fn from(s: LikedSong) -> Self {
        Self {
            source: s.source,
            external_id: Some(s.external_id),
            title: Some(s.title),
            artist: s.artist,
            album: s.album,
        }
    }
}

impl From<SongHistory> for SongResponse {
    fn from(h: SongHistory) -> Self {
        Self {
            source: h.source,
            external_id: h.external_id,
            title: h.title,
            artist: h.artist,
            album: h.album,
        }
    }
}

impl From<Song> for SongResponse {
    fn from(s: Song) -> Self {
        Self {
            source: s.source,
            external_id: Some(s.external_id),
            title: Some(s.title),
            artist: s.artist,
            album: s.album,
        }
    }
}
