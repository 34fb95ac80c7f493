use crate::application::services::local_store::{LocalStore, StoreKey};
use crate::domain::entities::{QueueEntry, QueueHealth};
use crate::domain::value_objects::{EntityType, MutationOperation, MutationPayload, QueueEntryId};
use crate::shared::error::AppError;
use tokio::sync::{mpsc, oneshot};

const COMMAND_BUFFER: usize = 64;

enum QueueCommand {
    Enqueue {
        entry: QueueEntry,
        reply: oneshot::Sender<QueueEntry>,
    },
    PeekAll {
        reply: oneshot::Sender<Vec<QueueEntry>>,
    },
    Remove {
        id: QueueEntryId,
        reply: oneshot::Sender<bool>,
    },
    Replace {
        id: QueueEntryId,
        entry: QueueEntry,
        reply: oneshot::Sender<bool>,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
    Health {
        reply: oneshot::Sender<QueueHealth>,
    },
    Flush {
        reply: oneshot::Sender<Result<(), AppError>>,
    },
    Shutdown {
        reply: oneshot::Sender<Result<(), AppError>>,
    },
}

/// Handle to the single task that owns the pending-mutation list.
///
/// Every read-modify-write of the persisted list happens inside that task, so
/// a `remove` issued by a sync pass cannot race an `enqueue` from the UI.
#[derive(Clone)]
pub struct MutationQueue {
    tx: mpsc::Sender<QueueCommand>,
}

impl MutationQueue {
    /// Loads the persisted queue and starts the owning task.
    pub async fn init(store: LocalStore) -> Result<Self, AppError> {
        let entries = store
            .read_entry::<Vec<QueueEntry>>(StoreKey::Queue)
            .await?
            .map(|entry| entry.data)
            .unwrap_or_default();

        tracing::info!(
            target: "sync::queue",
            namespace = store.namespace(),
            pending = entries.len(),
            "mutation queue loaded"
        );

        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let actor = QueueActor {
            entries,
            store,
            persistence_failures: 0,
            last_persist_error: None,
        };
        tokio::spawn(actor.run(rx));

        Ok(Self { tx })
    }

    /// Appends a mutation. The entry is returned even when it could not be
    /// persisted; [`MutationQueue::health`] reports that case.
    pub async fn enqueue(
        &self,
        entity_type: EntityType,
        operation: Option<MutationOperation>,
        payload: MutationPayload,
    ) -> Result<QueueEntry, AppError> {
        let entry =
            QueueEntry::new(entity_type, operation, payload).map_err(AppError::ValidationError)?;
        self.request(|reply| QueueCommand::Enqueue { entry, reply })
            .await
    }

    /// FIFO snapshot of the pending entries.
    pub async fn peek_all(&self) -> Result<Vec<QueueEntry>, AppError> {
        self.request(|reply| QueueCommand::PeekAll { reply }).await
    }

    pub async fn remove(&self, id: &QueueEntryId) -> Result<bool, AppError> {
        let id = id.clone();
        self.request(|reply| QueueCommand::Remove { id, reply })
            .await
    }

    /// Swaps the entry with `id` for `entry`, keeping its queue position.
    pub async fn replace(&self, id: &QueueEntryId, entry: QueueEntry) -> Result<bool, AppError> {
        let id = id.clone();
        self.request(|reply| QueueCommand::Replace { id, entry, reply })
            .await
    }

    pub async fn count(&self) -> Result<usize, AppError> {
        self.request(|reply| QueueCommand::Count { reply }).await
    }

    pub async fn health(&self) -> Result<QueueHealth, AppError> {
        self.request(|reply| QueueCommand::Health { reply }).await
    }

    /// Re-persists the in-memory list, surfacing the storage error if any.
    pub async fn flush(&self) -> Result<(), AppError> {
        self.request(|reply| QueueCommand::Flush { reply }).await?
    }

    /// Flushes and stops the owning task. Later calls on any handle fail.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.request(|reply| QueueCommand::Shutdown { reply })
            .await?
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> QueueCommand,
    ) -> Result<T, AppError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| AppError::Internal("mutation queue is not running".to_string()))?;
        rx.await
            .map_err(|_| AppError::Internal("mutation queue stopped before replying".to_string()))
    }
}

struct QueueActor {
    entries: Vec<QueueEntry>,
    store: LocalStore,
    persistence_failures: u64,
    last_persist_error: Option<String>,
}

impl QueueActor {
    async fn run(mut self, mut rx: mpsc::Receiver<QueueCommand>) {
        while let Some(command) = rx.recv().await {
            match command {
                QueueCommand::Enqueue { entry, reply } => {
                    self.entries.push(entry.clone());
                    let _ = self.persist().await;
                    tracing::debug!(
                        target: "sync::queue",
                        id = %entry.id,
                        entity_type = %entry.entity_type,
                        operation = entry.operation_label(),
                        pending = self.entries.len(),
                        "mutation enqueued"
                    );
                    let _ = reply.send(entry);
                }
                QueueCommand::PeekAll { reply } => {
                    let _ = reply.send(self.entries.clone());
                }
                QueueCommand::Remove { id, reply } => {
                    let before = self.entries.len();
                    self.entries.retain(|entry| entry.id != id);
                    let removed = self.entries.len() != before;
                    if removed {
                        let _ = self.persist().await;
                    }
                    let _ = reply.send(removed);
                }
                QueueCommand::Replace { id, entry, reply } => {
                    let replaced = match self.entries.iter_mut().find(|current| current.id == id) {
                        Some(slot) => {
                            *slot = entry;
                            true
                        }
                        None => false,
                    };
                    if replaced {
                        let _ = self.persist().await;
                    }
                    let _ = reply.send(replaced);
                }
                QueueCommand::Count { reply } => {
                    let _ = reply.send(self.entries.len());
                }
                QueueCommand::Health { reply } => {
                    let _ = reply.send(QueueHealth {
                        pending: self.entries.len(),
                        persistence_failures: self.persistence_failures,
                        last_persist_error: self.last_persist_error.clone(),
                    });
                }
                QueueCommand::Flush { reply } => {
                    let _ = reply.send(self.persist().await);
                }
                QueueCommand::Shutdown { reply } => {
                    let result = self.persist().await;
                    tracing::info!(
                        target: "sync::queue",
                        pending = self.entries.len(),
                        "mutation queue stopped"
                    );
                    let _ = reply.send(result);
                    break;
                }
            }
        }
    }

    async fn persist(&mut self) -> Result<(), AppError> {
        match self.store.write_entry(StoreKey::Queue, &self.entries).await {
            Ok(()) => {
                self.last_persist_error = None;
                Ok(())
            }
            Err(err) => {
                self.persistence_failures += 1;
                self.last_persist_error = Some(err.to_string());
                tracing::warn!(
                    target: "sync::queue",
                    error = %err,
                    pending = self.entries.len(),
                    "mutation queue could not be persisted; pending entries will not survive a restart"
                );
                Err(err)
            }
        }
    }
}
