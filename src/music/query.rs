//! Emotion to search query mapping.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Negative-affect labels and the supportive intent searched for instead
/// when wellbeing mode is on.
const WELLBEING_MAP: &[(&str, &str)] = &[
    ("sad", "motivational"),
    ("depressed", "healing"),
    ("angry", "calm"),
    ("stressed", "relaxing"),
    ("fear", "courage"),
    ("anxious", "soothing"),
];

pub const LANGUAGE_PROMPT: &str = "Please select a language to continue.";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    #[error("No emotion detected yet")]
    NoEmotion,
}

/// Answer sent instead of tracks when the caller has not picked a language
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LanguagePrompt {
    pub message: String,
    pub available_languages: Vec<String>,
}

impl LanguagePrompt {
    pub fn new(languages: &[String]) -> Self {
        Self {
            message: LANGUAGE_PROMPT.to_string(),
            available_languages: languages.to_vec(),
        }
    }
}

/// Translate an emotion for wellbeing mode. Unknown labels pass through.
pub fn wellbeing_emotion(emotion: &str) -> Option<&'static str> {
    let lower = emotion.to_lowercase();
    WELLBEING_MAP
        .iter()
        .find(|(from, _)| *from == lower)
        .map(|(_, to)| *to)
}

/// The emotion actually searched for.
pub fn query_emotion(emotion: &str, wellbeing_enabled: bool) -> String {
    if wellbeing_enabled {
        if let Some(mapped) = wellbeing_emotion(emotion) {
            return mapped.to_string();
        }
    }
    emotion.to_string()
}

/// Build the provider search term: `"<emotion> <language>"`.
pub fn build_query(emotion: &str, wellbeing_enabled: bool, language: &str) -> String {
    format!("{} {}", query_emotion(emotion, wellbeing_enabled), language)
}

/// Pick the emotion to search for: the explicit one, else the latest logged.
pub fn resolve_emotion(
    requested: Option<&str>,
    latest_logged: Option<String>,
) -> Result<String, QueryError> {
    match requested.filter(|e| !e.is_empty()) {
        Some(emotion) => Ok(emotion.to_string()),
        None => latest_logged
            .filter(|e| !e.is_empty())
            .ok_or(QueryError::NoEmotion),
    }
}

/// `Ok(language)` when one was supplied, otherwise the prompt to show.
pub fn resolve_language(
    requested: Option<&str>,
    languages: &[String],
) -> Result<String, LanguagePrompt> {
    requested
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LanguagePrompt::new(languages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_languages;

    #[test]
    fn test_wellbeing_translation() {
        assert_eq!(build_query("sad", true, "English"), "motivational English");
        assert_eq!(build_query("sad", false, "English"), "sad English");
        assert_eq!(build_query("Depressed", true, "Hindi"), "healing Hindi");
        assert_eq!(build_query("ANGRY", true, "Tamil"), "calm Tamil");
        assert_eq!(build_query("stressed", true, "Telugu"), "relaxing Telugu");
        assert_eq!(build_query("fear", true, "Marathi"), "courage Marathi");
        assert_eq!(build_query("anxious", true, "Bengali"), "soothing Bengali");
    }

    #[test]
    fn test_unmapped_emotion_passes_through_unchanged() {
        assert_eq!(build_query("Happy", true, "English"), "Happy English");
        assert_eq!(query_emotion("surprise", true), "surprise");
    }

    #[test]
    fn test_no_normalisation_of_language() {
        assert_eq!(build_query("happy", false, " hindi"), "happy  hindi");
    }

    #[test]
    fn test_resolve_emotion() {
        assert_eq!(resolve_emotion(Some("sad"), None).unwrap(), "sad");
        assert_eq!(
            resolve_emotion(None, Some("happy".to_string())).unwrap(),
            "happy"
        );
        assert_eq!(
            resolve_emotion(Some(""), Some("calm".to_string())).unwrap(),
            "calm"
        );
        assert_eq!(resolve_emotion(None, None), Err(QueryError::NoEmotion));
    }

    #[test]
    fn test_missing_language_prompts_with_configured_list() {
        let languages = default_languages();
        let prompt = resolve_language(None, &languages).unwrap_err();
        assert_eq!(prompt.message, LANGUAGE_PROMPT);
        assert_eq!(
            prompt.available_languages,
            vec!["Hindi", "English", "Bengali", "Marathi", "Telugu", "Tamil"]
        );
        assert!(resolve_language(Some(""), &languages).is_err());
        assert_eq!(resolve_language(Some("Tamil"), &languages).unwrap(), "Tamil");
    }
}
