//! Debounced auto-save: edits settle for a quiet period, then one snapshot is submitted.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::AutoSaveConfig;

/// Quiet period before a save fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("submission rejected with status {0}")]
    Rejected(u16),
}

/// Where snapshots go. Returns the response status code.
#[async_trait]
pub trait Submit: Send + Sync + 'static {
    async fn submit(&self, target: &str, payload: String) -> Result<u16, SubmitError>;
}

/// A confirmed snapshot and the save that produced it (0 for the baseline).
struct Saved {
    generation: u64,
    snapshot: String,
}

#[derive(Default)]
struct Shared {
    /// `None` until the first observation records a baseline.
    saved: Mutex<Option<Saved>>,
    in_flight: AtomicUsize,
}

pub struct AutoSave<S: Submit> {
    submitter: Arc<S>,
    target: String,
    debounce: Duration,
    shared: Arc<Shared>,
    /// Generation of the most recently scheduled save.
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl<S: Submit> AutoSave<S> {
    pub fn new(submitter: S, target: impl Into<String>, debounce: Duration) -> Self {
        Self {
            submitter: Arc::new(submitter),
            target: target.into(),
            debounce,
            shared: Arc::new(Shared::default()),
            generation: 0,
            pending: None,
        }
    }

    /// Saves of encounter `encounter_id` go to the configured endpoint after
    /// the configured quiet period.
    pub fn from_config(submitter: S, cfg: &AutoSaveConfig, encounter_id: &str) -> Self {
        Self::new(submitter, cfg.url_for(encounter_id), cfg.debounce())
    }

    /// Record the current state of `data`. Returns whether a save was scheduled.
    ///
    /// A change supersedes any pending timer. Returning to the last saved
    /// state cancels the pending timer without scheduling another, unless a
    /// save is still in flight and may overwrite it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn observe<T: Serialize>(&mut self, data: &T) -> Result<bool, serde_json::Error> {
        let snapshot = serde_json::to_string(data)?;
        let mut saved = lock(&self.shared.saved);
        if saved.is_none() {
            debug!(url = %self.target, "auto-save baseline recorded");
            *saved = Some(Saved { generation: 0, snapshot });
            return Ok(false);
        }
        let unchanged = saved.as_ref().is_some_and(|s| s.snapshot == snapshot);
        drop(saved);
        if unchanged && !self.is_saving() {
            self.cancel();
            return Ok(false);
        }

        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let submitter = Arc::clone(&self.submitter);
        let shared = Arc::clone(&self.shared);
        let target = self.target.clone();
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            shared.in_flight.fetch_add(1, Ordering::SeqCst);
            // Detached so that a superseding edit cannot abort a save in flight.
            tokio::spawn(save(submitter, target, generation, snapshot, shared));
        }));
        Ok(true)
    }

    /// Cancel the pending debounce timer, if any. A save already in flight continues.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_saving(&self) -> bool {
        self.shared.in_flight.load(Ordering::SeqCst) > 0
    }

    /// The snapshot last confirmed by the submitter (or the baseline).
    pub fn last_saved(&self) -> Option<String> {
        lock(&self.shared.saved).as_ref().map(|s| s.snapshot.clone())
    }
}

impl<S: Submit> Drop for AutoSave<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn save<S: Submit>(submitter: Arc<S>, target: String, generation: u64, snapshot: String, shared: Arc<Shared>) {
    match submitter.submit(&target, snapshot.clone()).await {
        Ok(status) if (200..300).contains(&status) => {
            let mut saved = lock(&shared.saved);
            if saved.as_ref().is_some_and(|s| s.generation > generation) {
                debug!(url = %target, generation, "newer save already confirmed; keeping it");
            } else {
                *saved = Some(Saved { generation, snapshot });
                info!(url = %target, status, generation, "encounter saved");
            }
        }
        Ok(status) => warn!(url = %target, error = %SubmitError::Rejected(status), "failed to save encounter"),
        Err(err) => warn!(url = %target, error = %err, "failed to save encounter"),
    }
    shared.in_flight.fetch_sub(1, Ordering::SeqCst);
}

fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
