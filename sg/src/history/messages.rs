//! History manager messages
//!
//! Commands and responses for the actor pattern.

use tokio::sync::oneshot;

use super::{FormInputs, GenerationRecord, HistoryError, StatusUpdate};

/// Response from history operations
pub type HistoryResponse<T> = Result<T, HistoryError>;

/// Commands sent to the HistoryManager actor
#[derive(Debug)]
pub enum HistoryCommand {
    Append {
        record: GenerationRecord,
        reply: oneshot::Sender<HistoryResponse<()>>,
    },
    UpdateStatus {
        update: StatusUpdate,
        reply: oneshot::Sender<HistoryResponse<bool>>,
    },
    List {
        reply: oneshot::Sender<Vec<GenerationRecord>>,
    },
    Reapply {
        index: usize,
        reply: oneshot::Sender<Option<FormInputs>>,
    },
    Shutdown,
}

/// Broadcast after every persisted change so views can re-render
#[derive(Debug, Clone)]
pub enum HistoryEvent {
    Changed { records: Vec<GenerationRecord> },
}
