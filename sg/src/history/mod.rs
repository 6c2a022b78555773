//! Generation history
//!
//! A bounded, most-recent-first ledger of generation attempts, persisted in a
//! durable key-value [`Storage`] and owned by the [`HistoryManager`] actor.

mod error;
mod manager;
mod messages;
mod record;
mod storage;
mod store;

pub use error::HistoryError;
pub use manager::HistoryManager;
pub use messages::{HistoryCommand, HistoryEvent, HistoryResponse};
pub use record::{EXCERPT_CHARS, FormInputs, GenerationRecord, GenerationStatus, excerpt};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{HISTORY_KEY, HISTORY_LIMIT, HistoryStore, StatusUpdate};
