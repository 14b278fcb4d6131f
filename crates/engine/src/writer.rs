//! Background persistence writer for a single roadmap.
//!
//! The session hands every write to this task through a channel and moves
//! on immediately.  The task:
//! 1. applies writes strictly in the order they were dispatched,
//! 2. coalesces queued writes of the same kind down to the newest snapshot
//!    (every payload is a full-map replacement, so older ones are redundant),
//! 3. logs failures and carries on; nothing is retried or rolled back.
//!
//! Dropping the writer closes the channel.  Writes already queued still drain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use store::{NodePositions, RoadmapStore, StepStatusMap};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// A full-map write waiting to be applied.
#[derive(Debug)]
enum WriteRequest {
    Status(StepStatusMap),
    Positions(NodePositions),
}

/// Handle to the writer task.
pub struct PersistenceWriter {
    tx: mpsc::UnboundedSender<WriteRequest>,
    in_flight: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl PersistenceWriter {
    /// Spawn the writer task on the current tokio runtime.
    pub fn spawn(store: Arc<dyn RoadmapStore>, roadmap_id: Uuid) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let handle = tokio::spawn(run(store, roadmap_id, rx, Arc::clone(&in_flight)));
        Self { tx, in_flight, handle }
    }

    /// Queue a full status map replacement.
    pub fn save_status(&self, status: StepStatusMap) {
        self.dispatch(WriteRequest::Status(status));
    }

    /// Queue a full positions map replacement.
    pub fn save_positions(&self, positions: NodePositions) {
        self.dispatch(WriteRequest::Positions(positions));
    }

    /// Writes dispatched but not yet finished.
    pub fn pending(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Stop accepting writes and wait for the queue to drain.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            warn!("persistence writer task ended abnormally: {}", e);
        }
    }

    fn dispatch(&self, request: WriteRequest) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(request).is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            warn!("persistence writer is gone; dropping write");
        }
    }
}

/// Newest pending snapshot of each kind.
#[derive(Default)]
struct Batch {
    status: Option<StepStatusMap>,
    positions: Option<NodePositions>,
    taken: usize,
}

impl Batch {
    fn absorb(&mut self, request: WriteRequest) {
        self.taken += 1;
        match request {
            WriteRequest::Status(map) => self.status = Some(map),
            WriteRequest::Positions(map) => self.positions = Some(map),
        }
    }
}

async fn run(
    store: Arc<dyn RoadmapStore>,
    roadmap_id: Uuid,
    mut rx: mpsc::UnboundedReceiver<WriteRequest>,
    in_flight: Arc<AtomicUsize>,
) {
    while let Some(first) = rx.recv().await {
        let mut batch = Batch::default();
        batch.absorb(first);
        while let Ok(next) = rx.try_recv() {
            batch.absorb(next);
        }

        if let Some(status) = batch.status {
            match store.save_status(roadmap_id, &status).await {
                Ok(()) => debug!("saved {} step statuses for roadmap {}", status.len(), roadmap_id),
                Err(e) => warn!("failed to save step status for roadmap {}: {}", roadmap_id, e),
            }
        }

        if let Some(positions) = batch.positions {
            match store.save_positions(roadmap_id, &positions).await {
                Ok(()) => debug!("saved {} node positions for roadmap {}", positions.len(), roadmap_id),
                Err(e) => warn!("failed to save node positions for roadmap {}: {}", roadmap_id, e),
            }
        }

        in_flight.fetch_sub(batch.taken, Ordering::SeqCst);
    }
    debug!("persistence writer for roadmap {} stopped", roadmap_id);
}
