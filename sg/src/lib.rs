//! SongGen - lyrics to song workflow client
//!
//! Drives a multi-step workflow against a remote backend: generate lyrics,
//! approve them, submit them for audio synthesis, then poll the synthesis
//! task until it finishes. Every attempt is kept in a bounded local history.
//!
//! # Core Concepts
//!
//! - **Single-flight polling**: at most one synthesis task is tracked; a new
//!   submission supersedes the old one and stale answers are discarded
//! - **History ledger**: ten records, newest first, keyed by content id
//! - **Pure view**: the workflow only mutates [`view::ViewState`]; rendering
//!   happens behind [`view::ViewRenderer`]
//!
//! # Modules
//!
//! - [`api`] - `SongApi` trait, wire types and the reqwest client
//! - [`history`] - generation records, storage and the history actor
//! - [`poller`] - synthesis status polling
//! - [`view`] - view state and rendering seams
//! - [`workflow`] - the `WorkflowController`
//! - [`terminal`] - terminal renderer for the CLI
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod history;
pub mod poller;
pub mod terminal;
pub mod view;
pub mod workflow;

// Re-export commonly used types
pub use api::{ApiError, HttpSongApi, SongApi, SongStatus, TaskStatus};
pub use config::Config;
pub use history::{
    FileStorage, FormInputs, GenerationRecord, GenerationStatus, HistoryError, HistoryManager, HistoryStore,
    MemoryStorage, Storage,
};
pub use poller::{PollOutcome, PollState, PollerConfig, StatusPoller};
pub use terminal::TerminalUi;
pub use view::{Notification, NotificationLevel, NotificationSink, ViewHandle, ViewRenderer, ViewStage, ViewState};
pub use workflow::{WorkflowController, WorkflowError};
