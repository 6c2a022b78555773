//! WorkflowController - drives lyrics → approve → synthesize → poll
//!
//! One controller exists per session. It owns the current content id and the
//! last submitted inputs, issues backend requests, records every attempt in
//! the history and hands synthesis tasks to the [`StatusPoller`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ApiStatusSummary, GeneratedLyrics, LyricsRequest, SongApi};
use crate::history::{FormInputs, GenerationRecord, GenerationStatus, HistoryError, HistoryManager, StatusUpdate};
use crate::poller::{PollOutcome, PollerConfig, StatusPoller};
use crate::view::{ViewHandle, ViewStage};

const PARAMETERS_REQUIRED: &str = "ERROR: All parameters required";
const NO_DATA_TO_APPROVE: &str = "NO DATA TO APPROVE";
const NO_APPROVED_DATA: &str = "NO APPROVED DATA FOUND";
const NO_DATA_TO_SAVE: &str = "NO DATA TO SAVE";
const NO_AUDIO_DATA: &str = "NO AUDIO DATA AVAILABLE";

/// Errors returned by workflow operations
///
/// Every error has already been surfaced through the notification sink by
/// the time it is returned.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    NoContent(&'static str),

    #[error("No history record at index {0}")]
    HistoryIndex(usize),

    #[error("No history record for {0}")]
    UnknownContent(String),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct WorkflowController {
    api: Arc<dyn SongApi>,
    history: HistoryManager,
    poller: StatusPoller,
    view: ViewHandle,
    current_content_id: Option<String>,
    last_inputs: Option<FormInputs>,
}

impl WorkflowController {
    pub fn new(api: Arc<dyn SongApi>, history: HistoryManager, view: ViewHandle, poller_config: PollerConfig) -> Self {
        debug!("WorkflowController::new: called");
        let poller = StatusPoller::new(api.clone(), history.clone(), view.clone(), poller_config);
        Self {
            api,
            history,
            poller,
            view,
            current_content_id: None,
            last_inputs: None,
        }
    }

    pub fn current_content_id(&self) -> Option<&str> {
        self.current_content_id.as_deref()
    }

    pub fn last_inputs(&self) -> Option<&FormInputs> {
        self.last_inputs.as_ref()
    }

    pub fn view(&self) -> &ViewHandle {
        &self.view
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn poller(&self) -> &StatusPoller {
        &self.poller
    }

    /// Ask the backend for lyrics
    ///
    /// Blank inputs are rejected before any request is made.
    pub async fn submit_lyrics_request(
        &mut self,
        prompt: &str,
        genre: &str,
        mood: &str,
    ) -> Result<GeneratedLyrics, WorkflowError> {
        debug!(%prompt, %genre, %mood, "submit_lyrics_request: called");
        let inputs = FormInputs::new(prompt, genre, mood).trimmed();
        let missing = inputs.missing_fields();
        if !missing.is_empty() {
            debug!(?missing, "submit_lyrics_request: missing fields");
            self.view.warning(PARAMETERS_REQUIRED);
            return Err(WorkflowError::Validation(format!("missing {}", missing.join(", "))));
        }

        self.last_inputs = Some(inputs.clone());
        self.hide_cards();
        self.view.set_busy(true);

        let request = LyricsRequest {
            prompt: inputs.prompt.clone(),
            genre: inputs.genre.clone(),
            mood: inputs.mood.clone(),
        };
        let result = self.api.generate_lyrics(&request).await;
        self.view.set_busy(false);

        let generated = match result {
            Ok(generated) => generated,
            Err(e) => {
                warn!(error = %e, "Lyrics generation failed");
                match e.rejection() {
                    Some(message) => self.view.error(format!("GENERATION FAILED: {}", message)),
                    None => self.view.error("NETWORK CONNECTION FAILED"),
                }
                return Err(e.into());
            }
        };

        info!(content_id = %generated.content_id, "Lyrics generated");
        self.current_content_id = Some(generated.content_id.clone());

        let record = GenerationRecord::new(&generated.content_id, &inputs, &generated.lyrics);
        if let Err(e) = self.history.append(record).await {
            warn!(content_id = %generated.content_id, error = %e, "Could not record generation");
        }

        self.view.set_stage(ViewStage::LyricsShown {
            lyrics: generated.lyrics.clone(),
        });
        self.view.success("LYRICS GENERATION COMPLETE");
        Ok(generated)
    }

    /// Accept the lyrics on display; the record is left as it is
    pub fn approve(&mut self) -> Result<(), WorkflowError> {
        debug!(content_id = ?self.current_content_id, "approve: called");
        if self.current_content_id.is_none() {
            self.view.warning(NO_DATA_TO_APPROVE);
            return Err(WorkflowError::NoContent(NO_DATA_TO_APPROVE));
        }

        self.view.set_stage(ViewStage::Approved);
        self.view.success("LYRICS APPROVED - READY FOR SYNTHESIS");
        Ok(())
    }

    /// Resubmit the last inputs for a fresh set of lyrics
    pub async fn regenerate(&mut self) -> Result<GeneratedLyrics, WorkflowError> {
        debug!("regenerate: called");
        self.hide_cards();
        let Some(inputs) = self.last_inputs.clone() else {
            self.view.warning(PARAMETERS_REQUIRED);
            return Err(WorkflowError::Validation("no previous request".to_string()));
        };
        self.submit_lyrics_request(&inputs.prompt, &inputs.genre, &inputs.mood)
            .await
    }

    /// Start audio synthesis for the current lyrics and begin polling
    ///
    /// Returns the backend task id.
    pub async fn submit_synthesis(&mut self) -> Result<String, WorkflowError> {
        debug!(content_id = ?self.current_content_id, "submit_synthesis: called");
        let Some(content_id) = self.current_content_id.clone() else {
            self.view.warning(NO_APPROVED_DATA);
            return Err(WorkflowError::NoContent(NO_APPROVED_DATA));
        };

        self.view.set_busy(true);
        let result = self.api.generate_song(&content_id).await;

        let task_id = match result {
            Ok(task_id) => task_id,
            Err(e) => {
                self.view.set_busy(false);
                warn!(%content_id, error = %e, "Synthesis submission failed");
                match e.rejection() {
                    Some(message) => self.view.error(format!("SYNTHESIS FAILED: {}", message)),
                    None => self.view.error("SYNTHESIS ERROR"),
                }
                return Err(e.into());
            }
        };

        // No older poll may write to the record after it is reset below
        self.poller.quiesce().await;

        let update = StatusUpdate::new(&content_id, GenerationStatus::Generating).with_task_id(&task_id);
        if let Err(e) = self.history.update_status(update).await {
            warn!(%content_id, error = %e, "Could not record synthesis submission");
        }

        self.view.update(|view| {
            view.stage = ViewStage::Synthesizing {
                content_id: content_id.clone(),
                task_id: task_id.clone(),
            };
            view.busy = false;
        });
        self.view.success("AUDIO SYNTHESIS STARTED");

        info!(%content_id, %task_id, "Synthesis submitted");
        self.poller.start(&content_id, &task_id);
        Ok(task_id)
    }

    /// Pick up polling for a synthesis submitted in an earlier session
    ///
    /// The record must carry a task id and not be terminal yet. Returns the
    /// task id being polled.
    pub async fn resume_synthesis(&mut self, content_id: &str) -> Result<String, WorkflowError> {
        debug!(%content_id, "resume_synthesis: called");
        let record = self
            .history
            .list()
            .await?
            .into_iter()
            .find(|record| record.content_id == content_id)
            .ok_or_else(|| WorkflowError::UnknownContent(content_id.to_string()))?;

        if record.status.is_terminal() {
            self.view.info(format!("SYNTHESIS ALREADY {}", record.status.to_string().to_uppercase()));
            return Err(WorkflowError::Validation(format!(
                "{} is already {}",
                content_id, record.status
            )));
        }
        let Some(task_id) = record.task_id else {
            self.view.warning(NO_APPROVED_DATA);
            return Err(WorkflowError::NoContent(NO_APPROVED_DATA));
        };

        self.poller.quiesce().await;
        self.current_content_id = Some(record.content_id.clone());
        self.view.update(|view| {
            view.stage = ViewStage::Synthesizing {
                content_id: record.content_id.clone(),
                task_id: task_id.clone(),
            };
            view.busy = false;
        });

        info!(%content_id, %task_id, "Synthesis polling resumed");
        self.poller.start(&record.content_id, &task_id);
        Ok(task_id)
    }

    /// Ask the backend to store the current lyrics; returns the saved filename
    pub async fn save_lyrics(&self) -> Result<String, WorkflowError> {
        debug!(content_id = ?self.current_content_id, "save_lyrics: called");
        let Some(content_id) = self.current_content_id.as_deref() else {
            self.view.warning(NO_DATA_TO_SAVE);
            return Err(WorkflowError::NoContent(NO_DATA_TO_SAVE));
        };

        match self.api.save_lyrics(content_id).await {
            Ok(filename) => {
                self.view.success(format!("DATA SAVED: {}", filename));
                Ok(filename)
            }
            Err(e) => {
                warn!(%content_id, error = %e, "Save failed");
                match e.rejection() {
                    Some(message) => self.view.error(format!("SAVE FAILED: {}", message)),
                    None => self.view.error("SAVE OPERATION FAILED"),
                }
                Err(e.into())
            }
        }
    }

    /// Inputs of the history record at `index`, for refilling the form
    pub async fn reapply_from_history(&self, index: usize) -> Result<FormInputs, WorkflowError> {
        debug!(index, "reapply_from_history: called");
        let inputs = self
            .history
            .reapply_to_form(index)
            .await?
            .ok_or(WorkflowError::HistoryIndex(index))?;

        self.view.info("PARAMETERS LOADED FROM HISTORY");
        Ok(inputs)
    }

    /// Download the current song into `dir`
    pub async fn download_song(&self, dir: &Path) -> Result<PathBuf, WorkflowError> {
        debug!(content_id = ?self.current_content_id, ?dir, "download_song: called");
        let Some(content_id) = self.current_content_id.as_deref() else {
            self.view.warning(NO_AUDIO_DATA);
            return Err(WorkflowError::NoContent(NO_AUDIO_DATA));
        };
        self.download_content(content_id, dir).await
    }

    /// Download any song by content id into `dir`
    pub async fn download_content(&self, content_id: &str, dir: &Path) -> Result<PathBuf, WorkflowError> {
        debug!(%content_id, ?dir, "download_content: called");
        let song = match self.api.download_song(content_id).await {
            Ok(song) => song,
            Err(e) => {
                warn!(%content_id, error = %e, "Download failed");
                self.view.error(format!("DOWNLOAD FAILED: {}", e));
                return Err(e.into());
            }
        };

        let filename = song
            .filename
            .unwrap_or_else(|| format!("ai-generated-song-{}.mp3", Utc::now().timestamp_millis()));
        let path = dir.join(filename);

        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, &song.bytes).await
        }
        .await;
        if let Err(e) = written {
            warn!(path = %path.display(), error = %e, "Could not write download");
            self.view.error(format!("DOWNLOAD FAILED: {}", e));
            return Err(e.into());
        }

        info!(%content_id, path = %path.display(), bytes = song.bytes.len(), "Song downloaded");
        self.view.success(format!("DOWNLOAD COMPLETE: {}", path.display()));
        Ok(path)
    }

    pub async fn check_api_status(&self) -> Result<ApiStatusSummary, WorkflowError> {
        debug!("check_api_status: called");
        match self.api.api_status().await {
            Ok(status) => Ok(ApiStatusSummary::from(&status)),
            Err(e) => {
                warn!(error = %e, "Status check failed");
                self.view.error("STATUS CHECK FAILED");
                Err(e.into())
            }
        }
    }

    /// Number of backend songs per reported status
    pub async fn song_counts(&self) -> Result<BTreeMap<String, usize>, WorkflowError> {
        debug!("song_counts: called");
        match self.api.song_status().await {
            Ok(list) => Ok(list.counts()),
            Err(e) => {
                warn!(error = %e, "Song status check failed");
                self.view.error("STATUS CHECK FAILED");
                Err(e.into())
            }
        }
    }

    pub async fn test_connection(&self) -> Result<(), WorkflowError> {
        debug!("test_connection: called");
        match self.api.test_connection().await {
            Ok(()) => {
                self.view.success("SUNO API TEST SUCCESSFUL");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Connection test failed");
                match e.rejection() {
                    Some(message) => self.view.error(format!("SUNO API TEST FAILED: {}", message)),
                    None => self.view.error("API TEST ERROR"),
                }
                Err(e.into())
            }
        }
    }

    /// Wait until the running synthesis poll ends
    ///
    /// Returns `None` when no synthesis was ever started.
    pub async fn wait_for_completion(&self) -> Option<PollOutcome> {
        debug!("wait_for_completion: called");
        self.poller.wait_for_outcome().await
    }

    /// Hide the lyrics and synthesis panels and stop any polling
    pub fn hide_cards(&self) {
        debug!("hide_cards: called");
        self.poller.cancel();
        self.view.set_stage(ViewStage::Idle);
    }

    /// End the session: stop polling and the history actor
    pub async fn teardown(&mut self) {
        debug!("teardown: called");
        self.poller.cancel();
        self.history.shutdown().await;
        info!("Workflow torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::mock::MockSongApi;
    use crate::api::{ApiStatus, ServiceHealth, SongStatus, TaskStatus};
    use crate::history::{HistoryStore, MemoryStorage};
    use crate::view::NotificationLevel;
    use crate::view::recording::RecordingUi;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Fixture {
        api: Arc<MockSongApi>,
        ui: Arc<RecordingUi>,
        controller: WorkflowController,
    }

    fn fixture() -> Fixture {
        let api = Arc::new(MockSongApi::new());
        let history = HistoryManager::spawn(HistoryStore::load(Box::new(MemoryStorage::new())));
        let ui = RecordingUi::new();
        let config = PollerConfig {
            initial_delay_ms: 0,
            interval_ms: 5,
        };
        let controller = WorkflowController::new(api.clone(), history, ui.handle(), config);
        Fixture { api, ui, controller }
    }

    fn lyrics(content_id: &str) -> GeneratedLyrics {
        GeneratedLyrics {
            lyrics: "drip drop on the window".to_string(),
            content_id: content_id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_blank_inputs_make_no_request() {
        let mut f = fixture();

        let result = f.controller.submit_lyrics_request("rain", "  ", "calm").await;

        assert!(matches!(result, Err(WorkflowError::Validation(_))));
        assert!(f.api.calls().is_empty());
        assert_eq!(f.ui.messages(NotificationLevel::Warning), vec![PARAMETERS_REQUIRED]);
        assert!(f.controller.last_inputs().is_none());
        assert!(f.controller.history().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lyrics_success_records_one_entry() {
        let mut f = fixture();
        f.api.push_lyrics(Ok(lyrics("c1")));

        let generated = f.controller.submit_lyrics_request(" rain ", "jazz", "calm").await.unwrap();

        assert_eq!(generated.content_id, "c1");
        assert_eq!(f.controller.current_content_id(), Some("c1"));
        let records = f.controller.history().list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].prompt, "rain");
        assert_eq!(records[0].status, GenerationStatus::LyricsGenerated);

        let view = f.controller.view().snapshot();
        assert!(matches!(view.stage, ViewStage::LyricsShown { .. }));
        assert!(!view.busy);
        assert!(f.ui.states().iter().any(|s| s.busy));
        assert_eq!(
            f.ui.messages(NotificationLevel::Success),
            vec!["LYRICS GENERATION COMPLETE"]
        );
    }

    #[tokio::test]
    async fn test_lyrics_rejection_creates_no_record() {
        let mut f = fixture();
        f.api.push_lyrics(Ok(lyrics("c1")));
        f.controller.submit_lyrics_request("rain", "jazz", "calm").await.unwrap();

        f.api.push_lyrics(Err(ApiError::Rejected("quota exceeded".to_string())));
        let result = f.controller.submit_lyrics_request("snow", "folk", "sad").await;

        assert!(matches!(result, Err(WorkflowError::Api(_))));
        assert_eq!(f.controller.current_content_id(), Some("c1"));
        assert_eq!(f.controller.history().list().await.unwrap().len(), 1);
        assert_eq!(
            f.ui.messages(NotificationLevel::Error),
            vec!["GENERATION FAILED: quota exceeded"]
        );
        assert!(!f.controller.view().snapshot().busy);
    }

    #[tokio::test]
    async fn test_lyrics_transport_failure_is_network_error() {
        let mut f = fixture();
        f.api.push_lyrics(Err(ApiError::Http {
            status: 502,
            message: "Bad gateway".to_string(),
        }));

        let result = f.controller.submit_lyrics_request("rain", "jazz", "calm").await;

        assert!(result.is_err());
        assert_eq!(f.controller.current_content_id(), None);
        assert_eq!(f.ui.messages(NotificationLevel::Error), vec!["NETWORK CONNECTION FAILED"]);
    }

    #[tokio::test]
    async fn test_approve_without_content() {
        let mut f = fixture();

        let result = f.controller.approve();

        assert!(matches!(result, Err(WorkflowError::NoContent(NO_DATA_TO_APPROVE))));
        assert_eq!(f.ui.messages(NotificationLevel::Warning), vec![NO_DATA_TO_APPROVE]);
        assert_eq!(f.controller.view().stage(), ViewStage::Idle);
    }

    #[tokio::test]
    async fn test_synthesis_and_save_require_content() {
        let mut f = fixture();

        assert!(matches!(
            f.controller.submit_synthesis().await,
            Err(WorkflowError::NoContent(NO_APPROVED_DATA))
        ));
        assert!(matches!(
            f.controller.save_lyrics().await,
            Err(WorkflowError::NoContent(NO_DATA_TO_SAVE))
        ));
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            f.controller.download_song(temp.path()).await,
            Err(WorkflowError::NoContent(NO_AUDIO_DATA))
        ));
        assert!(f.api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_regenerate_reuses_last_inputs() {
        let mut f = fixture();
        assert!(matches!(
            f.controller.regenerate().await,
            Err(WorkflowError::Validation(_))
        ));

        f.api.push_lyrics(Ok(lyrics("c1")));
        f.api.push_lyrics(Ok(lyrics("c2")));
        f.controller.submit_lyrics_request("rain", "jazz", "calm").await.unwrap();
        f.controller.regenerate().await.unwrap();

        assert_eq!(f.controller.current_content_id(), Some("c2"));
        let records = f.controller.history().list().await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.content_id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "c1"]);
        assert_eq!(records[0].inputs(), FormInputs::new("rain", "jazz", "calm"));
    }

    #[tokio::test]
    async fn test_synthesis_failure_leaves_status() {
        let mut f = fixture();
        f.api.push_lyrics(Ok(lyrics("c1")));
        f.controller.submit_lyrics_request("rain", "jazz", "calm").await.unwrap();
        f.controller.approve().unwrap();

        f.api.push_song(Err(ApiError::Rejected("no credits".to_string())));
        assert!(f.controller.submit_synthesis().await.is_err());

        let record = f.controller.history().list().await.unwrap().remove(0);
        assert_eq!(record.status, GenerationStatus::LyricsGenerated);
        assert!(record.task_id.is_none());
        assert!(!f.controller.poller().is_polling());
        assert_eq!(f.controller.view().stage(), ViewStage::Approved);
        assert_eq!(
            f.ui.messages(NotificationLevel::Error),
            vec!["SYNTHESIS FAILED: no credits"]
        );
    }

    #[tokio::test]
    async fn test_rain_jazz_calm_scenario() {
        let mut f = fixture();
        f.api.push_lyrics(Ok(lyrics("c1")));
        f.api.push_song(Ok("t1".to_string()));
        f.api.push_status(Ok(SongStatus::new(TaskStatus::Submitted)));
        f.api.push_status(Ok(SongStatus::completed("u1")));

        f.controller.submit_lyrics_request("rain", "jazz", "calm").await.unwrap();
        f.controller.approve().unwrap();
        let task_id = f.controller.submit_synthesis().await.unwrap();
        assert_eq!(task_id, "t1");

        let outcome = tokio::time::timeout(Duration::from_secs(2), f.controller.wait_for_completion())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Some(PollOutcome::Completed {
                content_id: "c1".to_string(),
                audio_url: Some("u1".to_string()),
            })
        );

        let record = f.controller.history().list().await.unwrap().remove(0);
        assert_eq!(record.status, GenerationStatus::Completed);
        assert_eq!(record.task_id.as_deref(), Some("t1"));
        assert_eq!(record.audio_url.as_deref(), Some("u1"));
        assert_eq!(f.api.call_count("check_song_status"), 2);

        let stages: Vec<_> = f.ui.states().iter().map(|s| s.stage.name()).collect();
        let position = |name| stages.iter().position(|s| *s == name).unwrap();
        assert!(position("lyrics-shown") < position("approved"));
        assert!(position("approved") < position("synthesizing"));
        assert!(position("synthesizing") < position("played"));
        assert!(
            f.ui.messages(NotificationLevel::Success)
                .contains(&"SONG READY: c1".to_string())
        );
    }

    #[tokio::test]
    async fn test_resume_synthesis_in_new_session() {
        let storage = MemoryStorage::new();
        let first = Arc::new(MockSongApi::new());
        first.push_lyrics(Ok(lyrics("c1")));
        first.push_song(Ok("t1".to_string()));
        let mut session = WorkflowController::new(
            first,
            HistoryManager::spawn(HistoryStore::load(Box::new(storage.clone()))),
            RecordingUi::new().handle(),
            PollerConfig {
                initial_delay_ms: 60_000,
                interval_ms: 60_000,
            },
        );
        session.submit_lyrics_request("rain", "jazz", "calm").await.unwrap();
        session.submit_synthesis().await.unwrap();
        session.teardown().await;

        let api = Arc::new(MockSongApi::new());
        api.push_status(Ok(SongStatus::completed("u1")));
        let ui = RecordingUi::new();
        let history = HistoryManager::spawn(HistoryStore::load(Box::new(storage)));
        let mut resumed = WorkflowController::new(
            api.clone(),
            history,
            ui.handle(),
            PollerConfig {
                initial_delay_ms: 0,
                interval_ms: 5,
            },
        );

        assert_eq!(resumed.resume_synthesis("c1").await.unwrap(), "t1");
        assert_eq!(resumed.current_content_id(), Some("c1"));
        let outcome = tokio::time::timeout(Duration::from_secs(2), resumed.wait_for_completion())
            .await
            .unwrap();
        assert!(matches!(outcome, Some(PollOutcome::Completed { .. })));

        let record = resumed.history().list().await.unwrap().remove(0);
        assert_eq!(record.status, GenerationStatus::Completed);
        assert_eq!(record.audio_url.as_deref(), Some("u1"));

        assert!(matches!(
            resumed.resume_synthesis("c1").await,
            Err(WorkflowError::Validation(_))
        ));
        assert!(matches!(
            resumed.resume_synthesis("ghost").await,
            Err(WorkflowError::UnknownContent(_))
        ));
    }

    #[tokio::test]
    async fn test_resume_without_task_id() {
        let mut f = fixture();
        f.api.push_lyrics(Ok(lyrics("c1")));
        f.controller.submit_lyrics_request("rain", "jazz", "calm").await.unwrap();

        assert!(matches!(
            f.controller.resume_synthesis("c1").await,
            Err(WorkflowError::NoContent(NO_APPROVED_DATA))
        ));
        assert!(!f.controller.poller().is_polling());
    }

    #[tokio::test]
    async fn test_new_lyrics_request_cancels_polling() {
        let mut f = fixture();
        f.api.push_lyrics(Ok(lyrics("c1")));
        f.api.push_song(Ok("t1".to_string()));
        f.controller.submit_lyrics_request("rain", "jazz", "calm").await.unwrap();
        f.controller.submit_synthesis().await.unwrap();
        assert!(f.controller.poller().is_polling());

        f.api.push_lyrics(Ok(lyrics("c2")));
        f.controller.submit_lyrics_request("snow", "folk", "sad").await.unwrap();

        assert!(!f.controller.poller().is_polling());
        assert_eq!(f.controller.wait_for_completion().await, Some(PollOutcome::Cancelled));
    }

    #[tokio::test]
    async fn test_save_lyrics_reports_filename() {
        let mut f = fixture();
        f.api.push_lyrics(Ok(lyrics("c1")));
        f.controller.submit_lyrics_request("rain", "jazz", "calm").await.unwrap();

        f.api.push_save(Ok("rain_c1.txt".to_string()));
        f.api.push_save(Err(ApiError::InvalidResponse("not json".to_string())));

        assert_eq!(f.controller.save_lyrics().await.unwrap(), "rain_c1.txt");
        assert!(f.controller.save_lyrics().await.is_err());
        assert!(
            f.ui.messages(NotificationLevel::Success)
                .contains(&"DATA SAVED: rain_c1.txt".to_string())
        );
        assert_eq!(f.ui.messages(NotificationLevel::Error), vec!["SAVE OPERATION FAILED"]);
    }

    #[tokio::test]
    async fn test_reapply_from_history() {
        let mut f = fixture();
        f.api.push_lyrics(Ok(lyrics("c1")));
        f.controller.submit_lyrics_request("rain", "jazz", "calm").await.unwrap();

        let inputs = f.controller.reapply_from_history(0).await.unwrap();
        assert_eq!(inputs, FormInputs::new("rain", "jazz", "calm"));
        assert_eq!(
            f.ui.messages(NotificationLevel::Info),
            vec!["PARAMETERS LOADED FROM HISTORY"]
        );

        assert!(matches!(
            f.controller.reapply_from_history(3).await,
            Err(WorkflowError::HistoryIndex(3))
        ));
    }

    #[tokio::test]
    async fn test_download_writes_server_filename() {
        let mut f = fixture();
        f.api.push_lyrics(Ok(lyrics("c1")));
        f.controller.submit_lyrics_request("rain", "jazz", "calm").await.unwrap();
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("songs");

        let path = f.controller.download_song(&dir).await.unwrap();

        assert_eq!(path, dir.join("c1.mp3"));
        assert_eq!(std::fs::read(&path).unwrap(), b"ID3");
    }

    #[tokio::test]
    async fn test_api_status_summary() {
        let f = fixture();
        assert!(f.controller.check_api_status().await.is_err());
        assert_eq!(f.ui.messages(NotificationLevel::Error), vec!["STATUS CHECK FAILED"]);

        f.api.set_api_status(ApiStatus {
            gemini: "configured".to_string(),
            suno: "configured".to_string(),
            suno_connection: Some("unreachable".to_string()),
        });
        let summary = f.controller.check_api_status().await.unwrap();
        assert_eq!(summary.lyrics_service, ServiceHealth::Online);
        assert_eq!(summary.audio_service, ServiceHealth::ConnectionError);
        assert!(!summary.configuration_required);
    }

    #[tokio::test]
    async fn test_connection_success_notifies() {
        let f = fixture();
        f.controller.test_connection().await.unwrap();
        assert_eq!(
            f.ui.messages(NotificationLevel::Success),
            vec!["SUNO API TEST SUCCESSFUL"]
        );
    }

    #[tokio::test]
    async fn test_teardown_stops_history() {
        let mut f = fixture();
        f.controller.teardown().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            f.controller.history().list().await,
            Err(HistoryError::ChannelError)
        ));
    }
}
