//! SongApi trait definition

use async_trait::async_trait;

use super::{ApiError, ApiStatus, DownloadedSong, GeneratedLyrics, LyricsRequest, SongStatus, SongStatusList};

/// Request/response client for the song backend
///
/// Every call is independent; the workflow state lives in the caller.
/// Implementations fold the backend's `success: false` envelope into
/// [`ApiError::Rejected`].
#[async_trait]
pub trait SongApi: Send + Sync {
    /// `POST generate-lyrics`
    async fn generate_lyrics(&self, request: &LyricsRequest) -> Result<GeneratedLyrics, ApiError>;

    /// `POST save-lyrics`, returns the filename the server wrote
    async fn save_lyrics(&self, content_id: &str) -> Result<String, ApiError>;

    /// `POST generate-song`, returns the synthesis task id
    async fn generate_song(&self, content_id: &str) -> Result<String, ApiError>;

    /// `GET check-song-status/{content_id}`
    async fn check_song_status(&self, content_id: &str) -> Result<SongStatus, ApiError>;

    /// `GET api-status`
    async fn api_status(&self) -> Result<ApiStatus, ApiError>;

    /// `GET song-status`
    async fn song_status(&self) -> Result<SongStatusList, ApiError>;

    /// `GET download-song/{content_id}`
    async fn download_song(&self, content_id: &str) -> Result<DownloadedSong, ApiError>;

    /// `POST test-suno-connection`
    async fn test_connection(&self) -> Result<(), ApiError>;
}
