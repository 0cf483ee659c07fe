//! Off-tick persistence
//!
//! The tick thread only pushes onto an unbounded queue. A tokio task drains
//! it and runs each blocking store write on the blocking pool.

use crate::error::StoreError;
use crate::frame::Recording;
use crate::store::RecordingStore;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Destination for sealed recordings that should be persisted.
pub trait RecordingSink {
    /// Hand off `recording` under `name`. Returns `false` if it was refused.
    fn submit(&mut self, name: &str, recording: Arc<Recording>) -> bool;
}

/// Synchronous sink: writes on the calling thread.
impl RecordingSink for RecordingStore {
    fn submit(&mut self, name: &str, recording: Arc<Recording>) -> bool {
        self.save(recording, name)
    }
}

#[derive(Debug)]
pub struct SaveRequest {
    pub name: String,
    pub recording: Arc<Recording>,
}

/// Non-blocking handle to a running [`PersistenceWorker`].
#[derive(Clone)]
pub struct SaveQueue {
    tx: UnboundedSender<SaveRequest>,
}

impl SaveQueue {
    pub fn enqueue(&self, name: &str, recording: Arc<Recording>) -> Result<(), StoreError> {
        self.tx
            .send(SaveRequest {
                name: name.to_string(),
                recording,
            })
            .map_err(|_| StoreError::WorkerClosed)
    }
}

impl RecordingSink for SaveQueue {
    fn submit(&mut self, name: &str, recording: Arc<Recording>) -> bool {
        match self.enqueue(name, recording) {
            Ok(()) => {
                debug!(name, "recording queued for save");
                true
            }
            Err(e) => {
                error!(name, error = %e, "could not queue recording");
                false
            }
        }
    }
}

pub type SharedStore = Arc<Mutex<RecordingStore>>;

fn lock(store: &SharedStore) -> MutexGuard<'_, RecordingStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct PersistenceWorker;

impl PersistenceWorker {
    /// Spawn the worker on the current tokio runtime. The task ends once
    /// every [`SaveQueue`] clone is dropped and yields the number of
    /// successful saves.
    pub fn spawn(store: SharedStore) -> (SaveQueue, JoinHandle<usize>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(Self::run(store, rx));
        (SaveQueue { tx }, handle)
    }

    async fn run(store: SharedStore, mut rx: UnboundedReceiver<SaveRequest>) -> usize {
        let mut saved = 0;
        while let Some(request) = rx.recv().await {
            let store = store.clone();
            let name = request.name.clone();
            let result = tokio::task::spawn_blocking(move || {
                lock(&store).save(request.recording, &request.name)
            })
            .await;

            match result {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(e) => error!(name, error = %e, "save task failed"),
            }
        }
        info!(saved, "persistence worker stopped");
        saved
    }
}

/// Load a recording without blocking the async runtime.
pub async fn load(store: SharedStore, name: String) -> Option<Arc<Recording>> {
    let result = tokio::task::spawn_blocking(move || lock(&store).load(&name)).await;
    match result {
        Ok(recording) => recording,
        Err(e) => {
            error!(error = %e, "load task failed");
            None
        }
    }
}

/// Stored names without blocking the async runtime.
pub async fn list(store: SharedStore) -> Vec<String> {
    tokio::task::spawn_blocking(move || lock(&store).list())
        .await
        .unwrap_or_default()
}
