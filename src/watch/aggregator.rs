// src/watch/aggregator.rs

//! Debounces raw filesystem changes into [`ChangeBatch`]es.
//!
//! At most one batch is pending at a time. The first change opens it, every
//! further change re-arms the quiet-period timer, and once the window passes
//! without changes the batch is sealed and sent to the runtime as
//! `RuntimeEvent::ChangesSealed`.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::engine::RuntimeEvent;
use crate::shutdown::Shutdown;
use crate::watch::batch::{ChangeBatch, RawChange};

/// Default quiet period.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy)]
pub struct ChangeAggregator {
    window: Duration,
}

impl Default for ChangeAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl ChangeAggregator {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn spawn(
        self,
        raw_rx: mpsc::UnboundedReceiver<RawChange>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        shutdown: Shutdown,
    ) -> JoinHandle<usize> {
        tokio::spawn(self.run(raw_rx, runtime_tx, shutdown))
    }

    /// Run until the raw channel closes, the runtime goes away, or shutdown
    /// is triggered while no batch is open. Returns the number of batches
    /// emitted.
    ///
    /// A batch that is already open when shutdown fires is still sealed and
    /// emitted, so no received change is dropped.
    pub async fn run(
        self,
        mut raw_rx: mpsc::UnboundedReceiver<RawChange>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        mut shutdown: Shutdown,
    ) -> usize {
        let mut emitted = 0;
        let mut pending: Option<ChangeBatch> = None;

        loop {
            match pending.take() {
                None => {
                    tokio::select! {
                        biased;
                        _ = shutdown.triggered() => {
                            debug!("shutdown; aggregator stops opening batches");
                            break;
                        }
                        msg = raw_rx.recv() => match msg {
                            Some(change) => {
                                debug!(path = ?change.path, kind = %change.kind, "opening batch");
                                pending = Some(ChangeBatch::open(change));
                            }
                            None => break,
                        },
                    }
                }
                Some(mut batch) => {
                    tokio::select! {
                        msg = raw_rx.recv() => match msg {
                            Some(change) => {
                                batch.push(change);
                                pending = Some(batch);
                            }
                            None => {
                                if emit(&runtime_tx, batch).await {
                                    emitted += 1;
                                }
                                break;
                            }
                        },
                        _ = sleep(self.window) => {
                            if !emit(&runtime_tx, batch).await {
                                break;
                            }
                            emitted += 1;
                        }
                    }
                }
            }
        }

        info!(batches = emitted, "change aggregator stopped");
        emitted
    }
}

/// Seal and send `batch`. Returns `false` if the runtime is gone.
async fn emit(runtime_tx: &mpsc::Sender<RuntimeEvent>, mut batch: ChangeBatch) -> bool {
    batch.seal();
    debug!(
        paths = batch.len(),
        events = batch.event_count(),
        "sealed change batch"
    );
    runtime_tx
        .send(RuntimeEvent::ChangesSealed(batch))
        .await
        .is_ok()
}
