//! HTTP implementation of SongApi

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_DISPOSITION;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    ApiError, ApiStatus, ConnectionTestResponse, ContentRequest, DownloadedSong, GeneratedLyrics, LyricsRequest,
    LyricsResponse, SaveResponse, SongApi, SongStatus, SongStatusList, SongSubmitResponse, StatusResponse,
    filename_from_disposition,
};
use crate::config::Config;

/// reqwest-backed client for the song backend
pub struct HttpSongApi {
    base_url: String,
    http: Client,
}

impl HttpSongApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into();
        debug!(%base_url, ?timeout, "HttpSongApi::new: called");
        let http = Client::builder().timeout(timeout).build().map_err(ApiError::Network)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone(), config.timeout())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        debug!(%path, "post_json: called");
        let response = self.http.post(self.url(path)).json(body).send().await?;
        Self::read_json(response).await
    }

    async fn get_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        debug!(%path, "get_json: called");
        let response = self.http.get(self.url(path)).send().await?;
        Self::read_json(response).await
    }

    /// Parse the body even on error statuses; the backend reports
    /// `{success: false, error}` with non-2xx codes too.
    async fn read_json<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<R>(&text) {
            Ok(parsed) => Ok(parsed),
            Err(e) if status.is_success() => {
                debug!(error = %e, "read_json: unparseable success body");
                Err(ApiError::Json(e))
            }
            Err(_) => {
                debug!(status = status.as_u16(), "read_json: HTTP error without JSON body");
                Err(ApiError::Http {
                    status: status.as_u16(),
                    message: text,
                })
            }
        }
    }
}

#[async_trait]
impl SongApi for HttpSongApi {
    async fn generate_lyrics(&self, request: &LyricsRequest) -> Result<GeneratedLyrics, ApiError> {
        debug!(genre = %request.genre, mood = %request.mood, "generate_lyrics: called");
        let response: LyricsResponse = self.post_json("generate-lyrics", request).await?;
        response.into_result()
    }

    async fn save_lyrics(&self, content_id: &str) -> Result<String, ApiError> {
        debug!(%content_id, "save_lyrics: called");
        let body = ContentRequest {
            content_id: content_id.to_string(),
        };
        let response: SaveResponse = self.post_json("save-lyrics", &body).await?;
        response.into_result()
    }

    async fn generate_song(&self, content_id: &str) -> Result<String, ApiError> {
        debug!(%content_id, "generate_song: called");
        let body = ContentRequest {
            content_id: content_id.to_string(),
        };
        let response: SongSubmitResponse = self.post_json("generate-song", &body).await?;
        response.into_result()
    }

    async fn check_song_status(&self, content_id: &str) -> Result<SongStatus, ApiError> {
        debug!(%content_id, "check_song_status: called");
        let response: StatusResponse = self.get_json(&format!("check-song-status/{}", content_id)).await?;
        response.into_result()
    }

    async fn api_status(&self) -> Result<ApiStatus, ApiError> {
        debug!("api_status: called");
        self.get_json("api-status").await
    }

    async fn song_status(&self) -> Result<SongStatusList, ApiError> {
        debug!("song_status: called");
        self.get_json("song-status").await
    }

    async fn download_song(&self, content_id: &str) -> Result<DownloadedSong, ApiError> {
        debug!(%content_id, "download_song: called");
        let response = self
            .http
            .get(self.url(&format!("download-song/{}", content_id)))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);
        let bytes = response.bytes().await?.to_vec();
        debug!(?filename, len = bytes.len(), "download_song: received");

        Ok(DownloadedSong { filename, bytes })
    }

    async fn test_connection(&self) -> Result<(), ApiError> {
        debug!("test_connection: called");
        let response: ConnectionTestResponse = self.post_json("test-suno-connection", &serde_json::json!({})).await?;
        response.into_result()
    }
}
