//! Song backend API
//!
//! The `SongApi` trait is the only seam between the workflow and the network.
//! `HttpSongApi` talks to the real backend; tests script a mock.

pub mod client;
mod error;
mod http;
mod types;

pub use client::SongApi;
pub use error::ApiError;
pub use http::HttpSongApi;
pub use types::{
    ApiStatus, ApiStatusSummary, ConnectionTestResponse, ContentRequest, DownloadedSong, GeneratedLyrics,
    LyricsRequest, LyricsResponse, SaveResponse, ServiceHealth, SongStatus, SongStatusList, SongSubmitResponse,
    SongSummary, StatusResponse, TaskStatus, filename_from_disposition,
};
