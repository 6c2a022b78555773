//! View state and the rendering/notification seams
//!
//! The workflow never touches presentation directly. It mutates a
//! [`ViewState`] through a [`ViewHandle`], which pushes every new state to the
//! [`ViewRenderer`]. Transient messages go to the [`NotificationSink`].

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::history::GenerationRecord;

/// Which panel the workflow is showing
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ViewStage {
    /// Only the request form
    #[default]
    Idle,
    /// Generated lyrics awaiting approval
    LyricsShown { lyrics: String },
    /// Lyrics approved, synthesis panel ready
    Approved,
    /// Synthesis running, progress indicator visible
    Synthesizing { content_id: String, task_id: String },
    /// Finished song in the player
    Played(SongView),
}

impl ViewStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::LyricsShown { .. } => "lyrics-shown",
            Self::Approved => "approved",
            Self::Synthesizing { .. } => "synthesizing",
            Self::Played(_) => "played",
        }
    }
}

/// A completed song as the player shows it
#[derive(Debug, Clone, PartialEq)]
pub struct SongView {
    pub content_id: String,
    pub audio_url: Option<String>,
    pub title: Option<String>,
    pub duration: Option<f64>,
    pub image_url: Option<String>,
}

/// Everything the renderer needs to draw the workflow
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub stage: ViewStage,
    /// A request is in flight; the submit control is disabled
    pub busy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// A transient toast message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Draws view state; must be a pure function of its input
pub trait ViewRenderer: Send + Sync {
    fn render(&self, state: &ViewState);

    /// Redraw the history list
    fn render_history(&self, _records: &[GenerationRecord]) {}
}

/// Shows transient messages
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Shared, clonable access to the current view state
#[derive(Clone)]
pub struct ViewHandle {
    state: Arc<Mutex<ViewState>>,
    renderer: Arc<dyn ViewRenderer>,
    notifier: Arc<dyn NotificationSink>,
}

impl ViewHandle {
    pub fn new(renderer: Arc<dyn ViewRenderer>, notifier: Arc<dyn NotificationSink>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState::default())),
            renderer,
            notifier,
        }
    }

    /// Mutate the state and render the result
    pub fn update(&self, f: impl FnOnce(&mut ViewState)) {
        let snapshot = {
            let mut state = self.lock();
            f(&mut state);
            state.clone()
        };
        debug!(stage = snapshot.stage.name(), busy = snapshot.busy, "ViewHandle::update: rendering");
        self.renderer.render(&snapshot);
    }

    pub fn set_stage(&self, stage: ViewStage) {
        self.update(|state| state.stage = stage);
    }

    pub fn set_busy(&self, busy: bool) {
        self.update(|state| state.busy = busy);
    }

    pub fn snapshot(&self) -> ViewState {
        self.lock().clone()
    }

    pub fn stage(&self) -> ViewStage {
        self.lock().stage.clone()
    }

    pub fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.notifier.notify(Notification {
            level,
            message: message.into(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(NotificationLevel::Error, message);
    }

    pub fn render_history(&self, records: &[GenerationRecord]) {
        self.renderer.render_history(records);
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        // A panicked renderer must not wedge the workflow
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
