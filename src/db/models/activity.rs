//! Append-only activity logs: emotions, voice commands and gestures.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmotionLog {
    pub id: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub emotion: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VoiceCommandLog {
    pub id: String,
    pub user_id: String,
    pub command: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GestureLog {
    pub id: String,
    pub user_id: String,
    pub gesture: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
pub struct LogEmotionRequest {
    pub emotion: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GestureMapRequest {
    pub gesture_name: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceCommandRequest {
    pub command_phrase: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceCommandResponse {
    pub message: String,
    pub action_executed: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
