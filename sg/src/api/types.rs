//! Wire types for the song backend
//!
//! Field names mirror the backend's JSON bodies exactly. Every response type
//! has an `into_result` that folds the `success`/`error` envelope into a
//! `Result`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ApiError;

const UNKNOWN_ERROR: &str = "unknown error";

/// Body of `POST generate-lyrics`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsRequest {
    pub prompt: String,
    pub genre: String,
    pub mood: String,
}

/// Body of `POST save-lyrics` and `POST generate-song`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRequest {
    pub content_id: String,
}

/// Lyrics accepted by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedLyrics {
    pub lyrics: String,
    pub content_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LyricsResponse {
    pub success: bool,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl LyricsResponse {
    pub fn into_result(self) -> Result<GeneratedLyrics, ApiError> {
        if !self.success {
            return Err(rejected(self.error));
        }
        match (self.lyrics, self.content_id) {
            (Some(lyrics), Some(content_id)) => Ok(GeneratedLyrics { lyrics, content_id }),
            _ => Err(ApiError::InvalidResponse(
                "generate-lyrics response missing lyrics or content_id".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn into_result(self) -> Result<String, ApiError> {
        if !self.success {
            return Err(rejected(self.error));
        }
        self.filename
            .ok_or_else(|| ApiError::InvalidResponse("save-lyrics response missing filename".to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SongSubmitResponse {
    pub success: bool,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl SongSubmitResponse {
    pub fn into_result(self) -> Result<String, ApiError> {
        if !self.success {
            return Err(rejected(self.error));
        }
        self.task_id
            .ok_or_else(|| ApiError::InvalidResponse("generate-song response missing task_id".to_string()))
    }
}

/// Status reported by the backend for a synthesis job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Generating,
    Submitted,
    Completed,
    Failed,
    /// Anything the backend adds later; treated as still running
    #[serde(other)]
    Unknown,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// One answer from `GET check-song-status/{content_id}`
#[derive(Debug, Clone, PartialEq)]
pub struct SongStatus {
    pub status: TaskStatus,
    pub audio_url: Option<String>,
    pub duration: Option<f64>,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub error_message: Option<String>,
}

impl SongStatus {
    /// A bare status with no metadata
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            audio_url: None,
            duration: None,
            title: None,
            image_url: None,
            error_message: None,
        }
    }

    pub fn completed(audio_url: impl Into<String>) -> Self {
        Self {
            audio_url: Some(audio_url.into()),
            ..Self::new(TaskStatus::Completed)
        }
    }

    pub fn failed(error_message: Option<String>) -> Self {
        Self {
            error_message,
            ..Self::new(TaskStatus::Failed)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    /// A reported status wins over the envelope: a job can fail while the
    /// status query itself is marked unsuccessful.
    pub fn into_result(self) -> Result<SongStatus, ApiError> {
        match self.status {
            Some(status) => Ok(SongStatus {
                status,
                audio_url: self.audio_url,
                duration: self.duration,
                title: self.title,
                image_url: self.image_url,
                error_message: self.error_message.or(self.error),
            }),
            None if !self.success => Err(rejected(self.error)),
            None => Err(ApiError::InvalidResponse(
                "check-song-status response missing status".to_string(),
            )),
        }
    }
}

/// Body of `GET api-status`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub gemini: String,
    #[serde(default)]
    pub suno: String,
    #[serde(default)]
    pub suno_connection: Option<String>,
}

/// Display health of one upstream service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceHealth {
    Online,
    ConnectionError,
    Offline,
}

impl std::fmt::Display for ServiceHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "ONLINE"),
            Self::ConnectionError => write!(f, "CONNECTION ERROR"),
            Self::Offline => write!(f, "OFFLINE"),
        }
    }
}

/// What the status panel shows for `GET api-status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiStatusSummary {
    pub lyrics_service: ServiceHealth,
    pub audio_service: ServiceHealth,
    /// The audio service is configured, so a connection test makes sense
    pub audio_testable: bool,
    pub configuration_required: bool,
}

impl From<&ApiStatus> for ApiStatusSummary {
    fn from(status: &ApiStatus) -> Self {
        let gemini_configured = status.gemini == "configured";
        let suno_configured = status.suno == "configured";

        let lyrics_service = if gemini_configured {
            ServiceHealth::Online
        } else {
            ServiceHealth::Offline
        };

        let audio_service = match (suno_configured, status.suno_connection.as_deref()) {
            (false, _) => ServiceHealth::Offline,
            (true, Some("reachable")) => ServiceHealth::Online,
            (true, _) => ServiceHealth::ConnectionError,
        };

        Self {
            lyrics_service,
            audio_service,
            audio_testable: suno_configured,
            configuration_required: !gemini_configured || !suno_configured,
        }
    }
}

/// One entry of `GET song-status`
#[derive(Debug, Clone, Deserialize)]
pub struct SongSummary {
    pub status: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Body of `GET song-status`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongStatusList {
    #[serde(default)]
    pub songs: Vec<SongSummary>,
}

impl SongStatusList {
    /// Number of songs per reported status
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for song in &self.songs {
            *counts.entry(song.status.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Body of `POST test-suno-connection`
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionTestResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ConnectionTestResponse {
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.success {
            Ok(())
        } else {
            Err(rejected(self.message.or(self.error)))
        }
    }
}

/// Audio file fetched from `GET download-song/{content_id}`
#[derive(Debug, Clone)]
pub struct DownloadedSong {
    /// Filename chosen by the server, when it sent one
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// Extract the filename from a `Content-Disposition` header value
///
/// Only the final path component is kept so a hostile header cannot point
/// outside the download directory.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let raw = header.split(';').map(str::trim).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        (key.trim().eq_ignore_ascii_case("filename")).then(|| value.trim().trim_matches('"'))
    })?;

    std::path::Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn rejected(error: Option<String>) -> ApiError {
    ApiError::Rejected(error.unwrap_or_else(|| UNKNOWN_ERROR.to_string()))
}
