//! Facial emotion classification.
//!
//! Inference runs outside this service. [`HttpEmotionClassifier`] posts the
//! raw image bytes to an inference endpoint that answers with one entry per
//! detected face: `[{"box": [...], "emotions": {"happy": 0.91, ...}}]`.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ensure_success, ProviderError};

/// Label to score for a single face
pub type FaceScores = BTreeMap<String, f64>;

#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Score every face found in the image, in detection order
    async fn detect(&self, image: &[u8]) -> Result<Vec<FaceScores>, ProviderError>;
}

/// Dominant emotion of the first detected face
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmotionDetection {
    pub emotion: String,
    pub confidence: f64,
    pub all_emotions: FaceScores,
}

impl EmotionDetection {
    /// `None` when no face was detected or the face carries no scores.
    pub fn from_faces(faces: Vec<FaceScores>) -> Option<Self> {
        let scores = faces.into_iter().next()?;
        let (emotion, confidence) = scores
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(label, score)| (label.clone(), *score))?;
        Some(Self {
            emotion,
            confidence: (confidence * 100.0).round() / 100.0,
            all_emotions: scores,
        })
    }
}

/// Decode a base64 image, with or without a `data:image/...;base64,` prefix.
pub fn decode_image(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let data = match payload.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    };
    base64::engine::general_purpose::STANDARD.decode(data.trim())
}

#[derive(Debug, Deserialize)]
struct DetectedFace {
    #[serde(default)]
    emotions: FaceScores,
}

pub struct HttpEmotionClassifier {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpEmotionClassifier {
    pub fn new(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EmotionClassifier for HttpEmotionClassifier {
    async fn detect(&self, image: &[u8]) -> Result<Vec<FaceScores>, ProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let faces: Vec<DetectedFace> = response.json().await?;
        Ok(faces.into_iter().map(|f| f.emotions).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(scores: &[(&str, f64)]) -> FaceScores {
        scores.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_picks_highest_score_of_first_face() {
        let faces = vec![
            face(&[("happy", 0.914), ("sad", 0.03), ("neutral", 0.05)]),
            face(&[("angry", 0.99)]),
        ];
        let detection = EmotionDetection::from_faces(faces).unwrap();
        assert_eq!(detection.emotion, "happy");
        assert_eq!(detection.confidence, 0.91);
        assert_eq!(detection.all_emotions.len(), 3);
    }

    #[test]
    fn test_no_face() {
        assert!(EmotionDetection::from_faces(vec![]).is_none());
        assert!(EmotionDetection::from_faces(vec![FaceScores::new()]).is_none());
    }

    #[test]
    fn test_decode_image_strips_data_url() {
        assert_eq!(decode_image("data:image/jpeg;base64,aGk=").unwrap(), b"hi");
        assert_eq!(decode_image("aGk=").unwrap(), b"hi");
        assert!(decode_image("not base64!").is_err());
    }

    #[test]
    fn test_face_payload_decoding() {
        let faces: Vec<DetectedFace> = serde_json::from_str(
            r#"[{"box":[1,2,3,4],"emotions":{"fear":0.2,"surprise":0.7}},{"box":[0,0,1,1]}]"#,
        )
        .unwrap();
        assert_eq!(faces[0].emotions["surprise"], 0.7);
        assert!(faces[1].emotions.is_empty());
    }
}
