//! Single-flight synthesis status poller
//!
//! One poll loop runs at a time. Every start and every cancel bumps an epoch
//! counter; a loop only applies a status answer while its own epoch is still
//! current, so a query that was already in flight when the poller was
//! superseded cannot touch newer state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{Notify, watch};
use tracing::{debug, info, warn};

use super::config::PollerConfig;
use crate::api::{ApiError, SongApi, SongStatus, TaskStatus};
use crate::history::{GenerationStatus, HistoryManager, StatusUpdate};
use crate::view::{SongView, ViewHandle, ViewStage};

/// Lifecycle of the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Completed,
    Failed,
    Cancelled,
}

/// How a poll run ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed {
        content_id: String,
        audio_url: Option<String>,
    },
    Failed {
        content_id: String,
        message: String,
    },
    Cancelled,
}

/// The synthesis task currently being polled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTask {
    pub content_id: String,
    pub task_id: String,
    pub epoch: u64,
}

#[derive(Debug)]
struct Tracker {
    state: PollState,
    active: Option<ActiveTask>,
}

enum Tick {
    Continue,
    Finished,
}

struct Shared {
    api: Arc<dyn SongApi>,
    history: HistoryManager,
    view: ViewHandle,
    config: PollerConfig,
    epoch: AtomicU64,
    tracker: Mutex<Tracker>,
    /// Wakes sleeping loops so a cancel takes effect at the timer
    wake: Notify,
    /// Held while a status answer is applied; serializes application
    /// across an outgoing and an incoming loop
    apply_lock: tokio::sync::Mutex<()>,
    outcome_tx: watch::Sender<Option<PollOutcome>>,
}

/// Tracks one in-flight synthesis task until it completes, fails or is superseded
#[derive(Clone)]
pub struct StatusPoller {
    shared: Arc<Shared>,
}

impl StatusPoller {
    pub fn new(api: Arc<dyn SongApi>, history: HistoryManager, view: ViewHandle, config: PollerConfig) -> Self {
        debug!(?config, "StatusPoller::new: called");
        let (outcome_tx, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                api,
                history,
                view,
                config,
                epoch: AtomicU64::new(0),
                tracker: Mutex::new(Tracker {
                    state: PollState::Idle,
                    active: None,
                }),
                wake: Notify::new(),
                apply_lock: tokio::sync::Mutex::new(()),
                outcome_tx,
            }),
        }
    }

    /// Start polling `content_id`, cancelling any loop already running
    ///
    /// Returns the epoch of the new loop.
    pub fn start(&self, content_id: impl Into<String>, task_id: impl Into<String>) -> u64 {
        let content_id = content_id.into();
        let task_id = task_id.into();
        debug!(%content_id, %task_id, "start: called");

        self.cancel();

        let epoch = {
            let mut tracker = self.shared.tracker();
            let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            tracker.active = Some(ActiveTask {
                content_id: content_id.clone(),
                task_id: task_id.clone(),
                epoch,
            });
            tracker.state = PollState::Polling;
            epoch
        };
        self.shared.outcome_tx.send_replace(None);

        info!(%content_id, %task_id, epoch, "Status polling started");
        tokio::spawn(poll_loop(self.shared.clone(), epoch, content_id));
        epoch
    }

    /// Stop the active loop; a no-op when nothing is polling
    ///
    /// A query already in flight is left to finish, but its answer is dropped.
    /// Returns whether a loop was cancelled.
    pub fn cancel(&self) -> bool {
        let cancelled = {
            let mut tracker = self.shared.tracker();
            let Some(active) = tracker.active.take() else {
                debug!("cancel: nothing active");
                return false;
            };
            self.shared.epoch.fetch_add(1, Ordering::SeqCst);
            tracker.state = PollState::Cancelled;
            active
        };

        self.shared.wake.notify_waiters();
        self.shared.outcome_tx.send_replace(Some(PollOutcome::Cancelled));
        info!(
            content_id = %cancelled.content_id,
            task_id = %cancelled.task_id,
            "Status polling cancelled"
        );
        true
    }

    /// Cancel, after waiting for any answer that is mid-application to land
    ///
    /// Once this returns no older loop can write to the history again.
    pub async fn quiesce(&self) {
        debug!("quiesce: called");
        let _guard = self.shared.apply_lock.lock().await;
        self.cancel();
    }

    /// Wait for the current run to end
    ///
    /// Returns `None` when nothing was ever started.
    pub async fn wait_for_outcome(&self) -> Option<PollOutcome> {
        let mut rx = self.shared.outcome_tx.subscribe();
        if self.active_task().is_none() {
            return rx.borrow().clone();
        }
        let outcome = rx.wait_for(|outcome| outcome.is_some()).await.ok()?;
        outcome.clone()
    }

    pub fn state(&self) -> PollState {
        self.shared.tracker().state
    }

    pub fn active_task(&self) -> Option<ActiveTask> {
        self.shared.tracker().active.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.state() == PollState::Polling
    }
}

async fn poll_loop(shared: Arc<Shared>, epoch: u64, content_id: String) {
    debug!(%content_id, epoch, "poll_loop: started");
    if !shared.pause(shared.config.initial_delay(), epoch).await {
        debug!(%content_id, epoch, "poll_loop: superseded before first query");
        return;
    }

    loop {
        let result = shared.api.check_song_status(&content_id).await;

        let tick = {
            let _guard = shared.apply_lock.lock().await;
            if !shared.is_current(epoch) {
                debug!(%content_id, epoch, "poll_loop: discarding response from superseded poll");
                return;
            }
            shared.apply(epoch, &content_id, result).await
        };

        if let Tick::Finished = tick {
            debug!(%content_id, epoch, "poll_loop: finished");
            return;
        }

        if !shared.pause(shared.config.interval(), epoch).await {
            debug!(%content_id, epoch, "poll_loop: cancelled while waiting");
            return;
        }
    }
}

impl Shared {
    fn tracker(&self) -> MutexGuard<'_, Tracker> {
        self.tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    /// Sleep for `duration` unless cancelled first; returns whether the loop should go on
    async fn pause(&self, duration: Duration, epoch: u64) -> bool {
        let notified = self.wake.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if !self.is_current(epoch) {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = &mut notified => {}
        }
        self.is_current(epoch)
    }

    async fn apply(&self, epoch: u64, content_id: &str, result: Result<SongStatus, ApiError>) -> Tick {
        let status = match result {
            Ok(status) => status,
            Err(e) => {
                warn!(%content_id, error = %e, transport = e.is_transport(), "Status query failed, retrying next tick");
                return Tick::Continue;
            }
        };

        if !status.status.is_terminal() {
            debug!(%content_id, status = ?status.status, "apply: still running");
            return Tick::Continue;
        }

        if status.status == TaskStatus::Completed {
            self.complete(epoch, content_id, status).await;
        } else {
            self.fail(epoch, content_id, status).await;
        }
        Tick::Finished
    }

    async fn complete(&self, epoch: u64, content_id: &str, status: SongStatus) {
        info!(%content_id, audio_url = ?status.audio_url, "Synthesis completed");
        let update = StatusUpdate::new(content_id, GenerationStatus::Completed).with_audio_url(status.audio_url.clone());
        if let Err(e) = self.history.update_status(update).await {
            warn!(%content_id, error = %e, "Could not record completed synthesis");
        }
        if !self.is_current(epoch) {
            debug!(%content_id, epoch, "complete: cancelled during history write, view left alone");
            return;
        }

        let song = SongView {
            content_id: content_id.to_string(),
            audio_url: status.audio_url.clone(),
            title: status.title.clone(),
            duration: status.duration,
            image_url: status.image_url,
        };
        self.view.update(|view| {
            view.stage = ViewStage::Played(song);
            view.busy = false;
        });
        self.view.success(format!(
            "SONG READY: {}",
            status.title.as_deref().unwrap_or(content_id)
        ));

        self.finish(
            epoch,
            PollState::Completed,
            PollOutcome::Completed {
                content_id: content_id.to_string(),
                audio_url: status.audio_url,
            },
        );
    }

    async fn fail(&self, epoch: u64, content_id: &str, status: SongStatus) {
        let message = status.error_message.unwrap_or_else(|| "unknown error".to_string());
        warn!(%content_id, %message, "Synthesis failed");

        let update = StatusUpdate::new(content_id, GenerationStatus::Failed);
        if let Err(e) = self.history.update_status(update).await {
            warn!(%content_id, error = %e, "Could not record failed synthesis");
        }
        if !self.is_current(epoch) {
            debug!(%content_id, epoch, "fail: cancelled during history write, view left alone");
            return;
        }

        // Drop the progress indicator; the approved lyrics can be resubmitted
        self.view.update(|view| {
            if matches!(view.stage, ViewStage::Synthesizing { .. }) {
                view.stage = ViewStage::Approved;
            }
            view.busy = false;
        });
        self.view.error(format!("SYNTHESIS FAILED: {}", message));

        self.finish(
            epoch,
            PollState::Failed,
            PollOutcome::Failed {
                content_id: content_id.to_string(),
                message,
            },
        );
    }

    /// Retire the run, unless it was cancelled while its answer was being applied
    fn finish(&self, epoch: u64, state: PollState, outcome: PollOutcome) {
        {
            let mut tracker = self.tracker();
            if tracker.active.as_ref().map(|active| active.epoch) != Some(epoch) {
                debug!(epoch, "finish: run already retired");
                return;
            }
            tracker.active = None;
            tracker.state = state;
        }
        self.outcome_tx.send_replace(Some(outcome));
    }
}
