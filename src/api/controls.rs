//! Hands-free playback controls: gesture mappings and voice commands.

use axum::{extract::State, Json};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ApiError, ValidationErrorBuilder};
use super::extract::ValidJson;
use super::validation::require;
use crate::db::{
    self, GestureMapRequest, MessageResponse, User, VoiceCommandRequest, VoiceCommandResponse,
};
use crate::music::voice::interpret;
use crate::AppState;

/// POST /api/gestures/map
pub async fn map_gesture(
    State(state): State<Arc<AppState>>,
    user: User,
    ValidJson(request): ValidJson<GestureMapRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let mut errors = ValidationErrorBuilder::new();
    let gesture = require(&request.gesture_name, "gestureName")
        .map_err(|e| errors.add("gestureName", e))
        .ok();
    let action = require(&request.action, "action")
        .map_err(|e| errors.add("action", e))
        .ok();
    errors.finish()?;
    let (Some(gesture), Some(action)) = (gesture, action) else {
        return Err(ApiError::bad_request("Invalid gesture name or action"));
    };

    sqlx::query("INSERT INTO gesture_logs (id, user_id, gesture, timestamp) VALUES (?, ?, ?, ?)")
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&user.id)
        .bind(format!("{}:{}", gesture, action))
        .bind(db::now())
        .execute(&state.db)
        .await?;

    debug!(user_id = %user.id, gesture, action, "Gesture mapped");
    Ok(Json(MessageResponse::new("Gesture mapped successfully")))
}

/// Interpret a spoken phrase. Only recognized commands are logged.
///
/// POST /api/voice/command
pub async fn voice_command(
    State(state): State<Arc<AppState>>,
    user: User,
    ValidJson(request): ValidJson<VoiceCommandRequest>,
) -> Result<Json<VoiceCommandResponse>, ApiError> {
    let phrase = request
        .command_phrase
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation_field("commandPhrase", "Missing command phrase"))?;

    let action = interpret(phrase).map_err(|e| ApiError::bad_request(e.to_string()))?;

    sqlx::query(
        "INSERT INTO voice_command_logs (id, user_id, command, timestamp) VALUES (?, ?, ?, ?)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&user.id)
    .bind(phrase)
    .bind(db::now())
    .execute(&state.db)
    .await?;

    info!(user_id = %user.id, action = %action, "Voice command processed");

    Ok(Json(VoiceCommandResponse {
        message: "Voice command processed".to_string(),
        action_executed: action.to_string(),
    }))
}
