//! HistoryManager - actor that owns the HistoryStore
//!
//! All ledger mutations funnel through one task, so each read-modify-write
//! of the persisted list runs to completion before the next one starts.

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use super::messages::{HistoryCommand, HistoryEvent, HistoryResponse};
use super::{FormInputs, GenerationRecord, HistoryError, HistoryStore, StatusUpdate};

/// Handle to send commands to the HistoryManager
#[derive(Clone)]
pub struct HistoryManager {
    tx: mpsc::Sender<HistoryCommand>,
    /// Broadcast sender for change notifications
    event_tx: broadcast::Sender<HistoryEvent>,
}

impl HistoryManager {
    /// Spawn the actor around an already-loaded store
    pub fn spawn(store: HistoryStore) -> Self {
        debug!(count = store.len(), "spawn: called");
        let (tx, rx) = mpsc::channel(64);
        let (event_tx, _) = broadcast::channel(16);

        tokio::spawn(actor_loop(store, rx, event_tx.clone()));

        info!("HistoryManager spawned");
        Self { tx, event_tx }
    }

    /// Subscribe to change events (one per persisted mutation)
    pub fn subscribe_events(&self) -> broadcast::Receiver<HistoryEvent> {
        self.event_tx.subscribe()
    }

    pub async fn append(&self, record: GenerationRecord) -> HistoryResponse<()> {
        debug!(content_id = %record.content_id, "append: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(HistoryCommand::Append {
            record,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| HistoryError::ChannelError)?
    }

    /// Returns whether a matching record existed
    pub async fn update_status(&self, update: StatusUpdate) -> HistoryResponse<bool> {
        debug!(content_id = %update.content_id, status = %update.status, "update_status: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(HistoryCommand::UpdateStatus {
            update,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| HistoryError::ChannelError)?
    }

    /// Snapshot of the ledger, most recent first
    pub async fn list(&self) -> HistoryResponse<Vec<GenerationRecord>> {
        debug!("list: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(HistoryCommand::List { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| HistoryError::ChannelError)
    }

    pub async fn reapply_to_form(&self, index: usize) -> HistoryResponse<Option<FormInputs>> {
        debug!(index, "reapply_to_form: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(HistoryCommand::Reapply { index, reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| HistoryError::ChannelError)
    }

    /// Stop the actor; later calls fail with `ChannelError`
    pub async fn shutdown(&self) {
        debug!("shutdown: called");
        let _ = self.tx.send(HistoryCommand::Shutdown).await;
    }

    async fn send(&self, command: HistoryCommand) -> HistoryResponse<()> {
        self.tx.send(command).await.map_err(|_| HistoryError::ChannelError)
    }
}

async fn actor_loop(
    mut store: HistoryStore,
    mut rx: mpsc::Receiver<HistoryCommand>,
    event_tx: broadcast::Sender<HistoryEvent>,
) {
    debug!("actor_loop: started");
    while let Some(command) = rx.recv().await {
        match command {
            HistoryCommand::Append { record, reply } => {
                let result = store.append(record);
                if result.is_ok() {
                    publish(&event_tx, &store);
                }
                let _ = reply.send(result);
            }
            HistoryCommand::UpdateStatus { update, reply } => {
                let result = store.update_status(update);
                if matches!(result, Ok(true)) {
                    publish(&event_tx, &store);
                }
                let _ = reply.send(result);
            }
            HistoryCommand::List { reply } => {
                let _ = reply.send(store.records().to_vec());
            }
            HistoryCommand::Reapply { index, reply } => {
                let inputs = store.reapply_to_form(index);
                if inputs.is_none() {
                    warn!(index, size = store.len(), "reapply index out of range");
                }
                let _ = reply.send(inputs);
            }
            HistoryCommand::Shutdown => {
                info!("HistoryManager shutting down");
                break;
            }
        }
    }
    debug!("actor_loop: exited");
}

fn publish(event_tx: &broadcast::Sender<HistoryEvent>, store: &HistoryStore) {
    // No subscribers is fine
    let _ = event_tx.send(HistoryEvent::Changed {
        records: store.records().to_vec(),
    });
}
