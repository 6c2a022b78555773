//! Synthesis status polling
//!
//! The StatusPoller queries the backend on a fixed interval until the
//! synthesis task reaches a terminal status or the poll is superseded.

mod config;
mod status_poller;

pub use config::PollerConfig;
pub use status_poller::{ActiveTask, PollOutcome, PollState, StatusPoller};
