//! Subscriber Broadcast Hub
//!
//! Maintains the set of live observers and fans pipeline results out to
//! them, best-effort. Each observer owns a bounded mpsc channel; the hub
//! holds the send half. Fan-out is **sequential** over a snapshot of the
//! registry taken at sweep start, so a single broadcast delivers in
//! registration order, while concurrent broadcasts for different readings
//! carry no cross-ordering guarantee.
//!
//! A delivery failure - the observer's channel closed, or full because the
//! observer stopped draining - marks the observer for removal; pruning
//! happens after the sweep completes, never while iterating. Losing an
//! observer never affects delivery to the others or the ingest caller.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::types::TelemetryUpdate;

/// Opaque handle identifying one registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Live observer registry with best-effort fan-out.
pub struct BroadcastHub {
    observers: RwLock<HashMap<ObserverId, mpsc::Sender<TelemetryUpdate>>>,
    next_id: AtomicU64,
    channel_capacity: usize,
}

impl BroadcastHub {
    /// `channel_capacity` bounds each observer's in-flight backlog.
    pub fn new(channel_capacity: usize) -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Register a new observer. Safe to call while broadcasts are in
    /// flight; the observer joins the next sweep's snapshot.
    pub async fn subscribe(&self) -> (ObserverId, mpsc::Receiver<TelemetryUpdate>) {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.channel_capacity);

        let count = {
            let mut observers = self.observers.write().await;
            observers.insert(id, tx);
            observers.len()
        };
        info!(observer = id.0, total = count, "Observer subscribed");

        (id, rx)
    }

    /// Remove an observer. Idempotent: removing an absent observer is a
    /// no-op.
    pub async fn unsubscribe(&self, id: ObserverId) {
        let removed = self.observers.write().await.remove(&id).is_some();
        if removed {
            info!(observer = id.0, "Observer unsubscribed");
        }
    }

    /// Number of currently registered observers.
    pub async fn observer_count(&self) -> usize {
        self.observers.read().await.len()
    }

    /// Deliver `update` to every registered observer, best-effort.
    ///
    /// Operates over a snapshot of the registry taken at sweep start;
    /// observers whose delivery fails are pruned after the sweep. Returns
    /// the number of successful deliveries.
    pub async fn broadcast(&self, update: &TelemetryUpdate) -> usize {
        let snapshot: Vec<(ObserverId, mpsc::Sender<TelemetryUpdate>)> = {
            let observers = self.observers.read().await;
            observers.iter().map(|(id, tx)| (*id, tx.clone())).collect()
        };

        let mut delivered = 0usize;
        let mut failed: Vec<ObserverId> = Vec::new();

        for (id, tx) in snapshot {
            match tx.try_send(update.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    debug!(observer = id.0, error = %e, "Broadcast delivery failed");
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut observers = self.observers.write().await;
            for id in &failed {
                observers.remove(id);
            }
            info!(
                pruned = failed.len(),
                remaining = observers.len(),
                "Pruned unreachable observers after broadcast sweep"
            );
        }

        delivered
    }
}
