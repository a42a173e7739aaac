//! Voice command phrases.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VoiceAction {
    NextSong,
    PreviousSong,
    Pause,
    Play,
}

impl VoiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NextSong => "next_song",
            Self::PreviousSong => "previous_song",
            Self::Pause => "pause",
            Self::Play => "play",
        }
    }
}

impl std::fmt::Display for VoiceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unrecognized command")]
pub struct UnrecognizedCommand;

const PHRASES: &[(&str, VoiceAction)] = &[
    ("play next song", VoiceAction::NextSong),
    ("play previous song", VoiceAction::PreviousSong),
    ("pause song", VoiceAction::Pause),
    ("play song", VoiceAction::Play),
];

/// Map a spoken phrase to an action. Only exact phrases match, ignoring case.
pub fn interpret(phrase: &str) -> Result<VoiceAction, UnrecognizedCommand> {
    let lower = phrase.to_lowercase();
    PHRASES
        .iter()
        .find(|(p, _)| *p == lower)
        .map(|(_, action)| *action)
        .ok_or(UnrecognizedCommand)
}
