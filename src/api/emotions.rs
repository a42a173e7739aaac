use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::ApiError;
use super::extract::ValidJson;
use super::validation::require;
use crate::db::{self, EmotionLog, LogEmotionRequest, MessageResponse, User};
use crate::music::classifier::{decode_image, EmotionDetection};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DetectEmotionRequest {
    pub image: Option<String>,
}

/// Answer of the detection endpoint: either a detection or a "nothing found"
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum DetectEmotionResponse {
    Detected(EmotionDetection),
    Nothing {
        emotion: Option<String>,
        confidence: u8,
        message: String,
    },
}

impl DetectEmotionResponse {
    fn nothing(message: &str) -> Self {
        Self::Nothing {
            emotion: None,
            confidence: 0,
            message: message.to_string(),
        }
    }
}

/// Most recent emotion logged by a user
pub async fn latest_emotion(pool: &db::DbPool, user_id: &str) -> Result<Option<String>, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT emotion FROM emotion_logs WHERE user_id = ? ORDER BY timestamp DESC, rowid DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(|(emotion,)| emotion))
}

/// POST /log_emotion
pub async fn log_emotion(
    State(state): State<Arc<AppState>>,
    user: User,
    ValidJson(request): ValidJson<LogEmotionRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let emotion = require(&request.emotion, "Emotion field")
        .map_err(|e| ApiError::validation_field("emotion", e))?;

    sqlx::query("INSERT INTO emotion_logs (id, user_id, emotion, timestamp) VALUES (?, ?, ?, ?)")
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&user.id)
        .bind(emotion)
        .bind(db::now())
        .execute(&state.db)
        .await?;

    debug!(user_id = %user.id, emotion, "Emotion logged");

    Ok(Json(MessageResponse::new(format!("Logged emotion: {}", emotion))))
}

/// Emotion history, newest first
///
/// GET /api/emotions
pub async fn list_emotions(
    State(state): State<Arc<AppState>>,
    user: User,
) -> Result<Json<Vec<EmotionLog>>, ApiError> {
    let logs: Vec<EmotionLog> = sqlx::query_as(
        "SELECT * FROM emotion_logs WHERE user_id = ? ORDER BY timestamp DESC, rowid DESC",
    )
    .bind(&user.id)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(logs))
}

/// POST /api/detect-emotion
pub async fn detect_emotion(
    State(state): State<Arc<AppState>>,
    user: User,
    ValidJson(request): ValidJson<DetectEmotionRequest>,
) -> Result<Json<DetectEmotionResponse>, ApiError> {
    let classifier = state
        .classifier
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Emotion detection service not available"))?;

    let payload = require(&request.image, "Image data")
        .map_err(|e| ApiError::validation_field("image", e))?;
    let image = decode_image(payload)
        .map_err(|e| ApiError::validation_field("image", format!("Invalid base64 image: {}", e)))?;

    let faces = classifier.detect(&image).await?;
    info!(user_id = %user.id, faces = faces.len(), "Emotion detection finished");

    if faces.is_empty() {
        return Ok(Json(DetectEmotionResponse::nothing("No face detected in the image")));
    }

    Ok(Json(match EmotionDetection::from_faces(faces) {
        Some(detection) => DetectEmotionResponse::Detected(detection),
        None => DetectEmotionResponse::nothing("Could not detect emotions"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nothing_detected_shape() {
        let json = serde_json::to_value(DetectEmotionResponse::nothing("No face detected in the image"))
            .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "emotion": null,
                "confidence": 0,
                "message": "No face detected in the image"
            })
        );
    }

    #[tokio::test]
    async fn test_latest_emotion_prefers_newest() {
        let pool = db::init_in_memory().await.unwrap();
        sqlx::query("INSERT INTO users (id, email, password_hash) VALUES ('u1', 'a@b.io', 'x')")
            .execute(&pool)
            .await
            .unwrap();
        assert_eq!(latest_emotion(&pool, "u1").await.unwrap(), None);

        for (emotion, ts) in [
            ("sad", "2026-01-01T10:00:00.000000Z"),
            ("happy", "2026-01-01T12:00:00.000000Z"),
            ("angry", "2026-01-01T11:00:00.000000Z"),
        ] {
            sqlx::query("INSERT INTO emotion_logs (id, user_id, emotion, timestamp) VALUES (?, 'u1', ?, ?)")
                .bind(uuid::Uuid::new_v4().to_string())
                .bind(emotion)
                .bind(ts)
                .execute(&pool)
                .await
                .unwrap();
        }

        assert_eq!(latest_emotion(&pool, "u1").await.unwrap().as_deref(), Some("happy"));
    }
}
