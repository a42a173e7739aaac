use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use super::emotions::latest_emotion;
use super::error::ApiError;
use super::validation::{given, present};
use crate::db::User;
use crate::music::{
    query::{query_emotion, resolve_emotion},
    build_query, resolve_language, search_tracks, RecommendedTrack, Track,
};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub emotion: Option<String>,
    pub language: Option<String>,
    pub wellbeing: Option<String>,
}

impl RecommendationQuery {
    fn wellbeing_enabled(&self) -> bool {
        self.wellbeing
            .as_deref()
            .is_some_and(|w| w.eq_ignore_ascii_case("true"))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Tracks for the given (or most recently logged) emotion in one language.
/// Without a language, answers with the list to pick from.
///
/// GET /api/recommendations
pub async fn recommendations(
    State(state): State<Arc<AppState>>,
    user: User,
    Query(params): Query<RecommendationQuery>,
) -> Result<Response, ApiError> {
    let requested = given(&params.emotion);
    let latest = match requested {
        Some(_) => None,
        None => latest_emotion(&state.db, &user.id).await?,
    };
    let emotion = resolve_emotion(requested, latest)?;

    let language = match resolve_language(
        params.language.as_deref(),
        &state.config.recommendations.languages,
    ) {
        Ok(language) => language,
        Err(prompt) => return Ok(Json(prompt).into_response()),
    };

    let wellbeing = params.wellbeing_enabled();
    let query = build_query(&emotion, wellbeing, &language);
    let searched_emotion = query_emotion(&emotion, wellbeing);

    let outcome = search_tracks(
        &state.broker,
        state.saavn.as_ref(),
        &user,
        &query,
        "track",
        state.config.providers.search_limit,
    )
    .await?;

    info!(
        user_id = %user.id,
        query = %query,
        source = %outcome.source,
        count = outcome.tracks.len(),
        "Recommendations served"
    );

    let tracks: Vec<RecommendedTrack> = outcome
        .tracks
        .into_iter()
        .map(|track| RecommendedTrack {
            track,
            emotion: searched_emotion.clone(),
            language: language.clone(),
            wellbeing_mode: wellbeing,
        })
        .collect();

    Ok(Json(tracks).into_response())
}

/// Free-text track search
///
/// GET /api/search
pub async fn search(
    State(state): State<Arc<AppState>>,
    user: User,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<Track>>, ApiError> {
    let query = present(&params.q).ok_or_else(|| ApiError::bad_request("Missing search query"))?;
    let kind = present(&params.kind).unwrap_or("track");
    if kind != "track" {
        return Err(ApiError::validation_field(
            "type",
            "Only type=track is supported",
        ));
    }

    let outcome = search_tracks(
        &state.broker,
        state.saavn.as_ref(),
        &user,
        query,
        kind,
        state.config.providers.search_limit,
    )
    .await?;

    Ok(Json(outcome.tracks))
}
