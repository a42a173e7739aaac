//! Normalized track records.
//!
//! Both providers answer with different JSON shapes. They are decoded into
//! optional-field structures and then normalized into [`Track`] with fixed
//! defaults:
//!
//! | field  | default when absent |
//! |--------|---------------------|
//! | title  | `"Unknown"`         |
//! | artist | `"Unknown"` (also for an empty artist list) |
//! | album  | `""`                |
//! | uri / url | `""`             |

use serde::{Deserialize, Serialize};

use crate::db::TrackSource;

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub title: String,
    /// Artist names joined with ", "
    pub artist: String,
    pub album: String,
    #[serde(rename = "spotifyUri", skip_serializing_if = "Option::is_none", default)]
    pub spotify_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
    pub source: TrackSource,
}

impl Track {
    /// Provider specific identifier used as the natural key for likes
    pub fn external_id(&self) -> &str {
        self.spotify_uri
            .as_deref()
            .or(self.url.as_deref())
            .unwrap_or_default()
    }
}

/// A track as returned by the recommendation endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedTrack {
    #[serde(flatten)]
    pub track: Track,
    pub emotion: String,
    pub language: String,
    pub wellbeing_mode: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct NamedRef {
    #[serde(default)]
    pub name: Option<String>,
}

pub(crate) fn join_artists(artists: &[NamedRef]) -> String {
    let names: Vec<&str> = artists
        .iter()
        .filter_map(|a| a.name.as_deref())
        .filter(|n| !n.is_empty())
        .collect();
    if names.is_empty() {
        UNKNOWN.to_string()
    } else {
        names.join(", ")
    }
}

// -------------------------------------------------------------------------
// Spotify: { "tracks": { "items": [ { name, artists, album, uri } ] } }
// -------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SpotifySearchResponse {
    #[serde(default)]
    pub tracks: Option<SpotifyTrackPage>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SpotifyTrackPage {
    #[serde(default)]
    pub items: Vec<SpotifyTrackItem>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SpotifyTrackItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Vec<NamedRef>,
    #[serde(default)]
    pub album: Option<NamedRef>,
    #[serde(default)]
    pub uri: Option<String>,
}

impl SpotifySearchResponse {
    pub fn into_tracks(self) -> Vec<Track> {
        self.tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .map(SpotifyTrackItem::into_track)
            .collect()
    }
}

impl SpotifyTrackItem {
    fn into_track(self) -> Track {
        Track {
            artist: join_artists(&self.artists),
            title: self.name.unwrap_or_else(|| UNKNOWN.to_string()),
            album: self.album.and_then(|a| a.name).unwrap_or_default(),
            spotify_uri: Some(self.uri.unwrap_or_default()),
            url: None,
            source: TrackSource::Spotify,
        }
    }
}

// -------------------------------------------------------------------------
// JioSaavn mirror: { "data": [ ... ] } or { "data": { "results": [ ... ] } }
// Artists are either a flat list or grouped under "primary".
// -------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SaavnSearchResponse {
    #[serde(default)]
    pub data: Option<SaavnData>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SaavnData {
    List(Vec<SaavnSong>),
    Page {
        #[serde(default)]
        results: Vec<SaavnSong>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SaavnArtists {
    List(Vec<NamedRef>),
    Grouped {
        #[serde(default)]
        primary: Vec<NamedRef>,
    },
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SaavnSong {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub artists: Option<SaavnArtists>,
    #[serde(default)]
    pub album: Option<NamedRef>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SaavnSearchResponse {
    pub fn into_tracks(self) -> Vec<Track> {
        let songs = match self.data {
            Some(SaavnData::List(songs)) => songs,
            Some(SaavnData::Page { results }) => results,
            None => Vec::new(),
        };
        songs.into_iter().map(SaavnSong::into_track).collect()
    }
}

impl SaavnSong {
    fn into_track(self) -> Track {
        let artists = match self.artists {
            Some(SaavnArtists::List(list)) => list,
            Some(SaavnArtists::Grouped { primary }) => primary,
            None => Vec::new(),
        };
        Track {
            artist: join_artists(&artists),
            title: self.name.unwrap_or_else(|| UNKNOWN.to_string()),
            album: self.album.and_then(|a| a.name).unwrap_or_default(),
            spotify_uri: None,
            url: Some(self.url.unwrap_or_default()),
            source: TrackSource::Jiosaavn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spotify_items_normalized() {
        let body = json!({
            "tracks": { "items": [
                {
                    "name": "Happy",
                    "artists": [{ "name": "Pharrell Williams" }, { "name": "Guest" }],
                    "album": { "name": "G I R L" },
                    "uri": "spotify:track:60nZcImufyMA1MKQY3dcCH"
                },
                { "uri": "spotify:track:bare" }
            ]}
        });
        let parsed: SpotifySearchResponse = serde_json::from_value(body).unwrap();
        let tracks = parsed.into_tracks();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].artist, "Pharrell Williams, Guest");
        assert_eq!(tracks[0].album, "G I R L");
        assert_eq!(tracks[0].external_id(), "spotify:track:60nZcImufyMA1MKQY3dcCH");
        assert_eq!(tracks[1].title, UNKNOWN);
        assert_eq!(tracks[1].artist, UNKNOWN);
        assert_eq!(tracks[1].album, "");
        assert_eq!(tracks[1].source, TrackSource::Spotify);
    }

    #[test]
    fn test_spotify_missing_tracks_is_empty() {
        let parsed: SpotifySearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(parsed.into_tracks().is_empty());
    }

    #[test]
    fn test_saavn_flat_list() {
        let body = json!({
            "data": [{
                "name": "Kesariya",
                "artists": [{ "name": "Arijit Singh" }],
                "album": { "name": "Brahmastra" },
                "url": "https://www.jiosaavn.com/song/kesariya/abc"
            }]
        });
        let parsed: SaavnSearchResponse = serde_json::from_value(body).unwrap();
        let tracks = parsed.into_tracks();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].artist, "Arijit Singh");
        assert_eq!(tracks[0].url.as_deref(), Some("https://www.jiosaavn.com/song/kesariya/abc"));
        assert_eq!(tracks[0].spotify_uri, None);
        assert_eq!(tracks[0].source, TrackSource::Jiosaavn);
    }

    #[test]
    fn test_saavn_paged_and_grouped_artists() {
        let body = json!({
            "success": true,
            "data": { "results": [{
                "name": "Tum Hi Ho",
                "artists": { "primary": [{ "name": "Arijit Singh" }], "all": [] },
                "url": "https://www.jiosaavn.com/song/tum-hi-ho/xyz"
            }]}
        });
        let parsed: SaavnSearchResponse = serde_json::from_value(body).unwrap();
        let tracks = parsed.into_tracks();

        assert_eq!(tracks[0].title, "Tum Hi Ho");
        assert_eq!(tracks[0].artist, "Arijit Singh");
        assert_eq!(tracks[0].album, "");
    }

    #[test]
    fn test_recommended_track_flattens() {
        let track = Track {
            title: "T".to_string(),
            artist: "A".to_string(),
            album: String::new(),
            spotify_uri: None,
            url: Some("u".to_string()),
            source: TrackSource::Jiosaavn,
        };
        let value = serde_json::to_value(RecommendedTrack {
            track,
            emotion: "calm".to_string(),
            language: "Tamil".to_string(),
            wellbeing_mode: true,
        })
        .unwrap();

        assert_eq!(value["title"], "T");
        assert_eq!(value["url"], "u");
        assert_eq!(value["source"], "jiosaavn");
        assert_eq!(value["wellbeing_mode"], true);
        assert!(value.get("spotifyUri").is_none());
    }
}
