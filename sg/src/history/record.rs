//! GenerationRecord domain type
//!
//! One record per lyrics-generation attempt, keyed by the backend content id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Characters of lyrics kept in the history preview
pub const EXCERPT_CHARS: usize = 100;

/// Where a generation attempt is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Lyrics exist, no synthesis submitted yet
    LyricsGenerated,
    /// Synthesis accepted by the backend
    Generating,
    /// Synthesis queued upstream
    Submitted,
    /// Audio is available
    Completed,
    /// Synthesis failed permanently
    Failed,
}

impl GenerationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LyricsGenerated => write!(f, "lyrics_generated"),
            Self::Generating => write!(f, "generating"),
            Self::Submitted => write!(f, "submitted"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The three form inputs of a generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInputs {
    pub prompt: String,
    pub genre: String,
    pub mood: String,
}

impl FormInputs {
    pub fn new(prompt: impl Into<String>, genre: impl Into<String>, mood: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            genre: genre.into(),
            mood: mood.into(),
        }
    }

    /// Copy with surrounding whitespace removed from every field
    pub fn trimmed(&self) -> Self {
        Self::new(self.prompt.trim(), self.genre.trim(), self.mood.trim())
    }

    /// Names of the fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [("prompt", &self.prompt), ("genre", &self.genre), ("mood", &self.mood)]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

/// One entry of the generation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub content_id: String,
    pub prompt: String,
    pub genre: String,
    pub mood: String,
    pub lyrics_excerpt: String,
    pub timestamp: DateTime<Utc>,
    pub status: GenerationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl GenerationRecord {
    /// Record for freshly generated lyrics
    pub fn new(content_id: impl Into<String>, inputs: &FormInputs, lyrics: &str) -> Self {
        Self {
            content_id: content_id.into(),
            prompt: inputs.prompt.clone(),
            genre: inputs.genre.clone(),
            mood: inputs.mood.clone(),
            lyrics_excerpt: excerpt(lyrics),
            timestamp: Utc::now(),
            status: GenerationStatus::LyricsGenerated,
            task_id: None,
            audio_url: None,
        }
    }

    pub fn inputs(&self) -> FormInputs {
        FormInputs::new(&self.prompt, &self.genre, &self.mood)
    }
}

/// First `EXCERPT_CHARS` characters, with `...` when anything was cut
pub fn excerpt(lyrics: &str) -> String {
    let mut chars = lyrics.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
