//! Ingest orchestration

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::ensemble::ModelEnsemble;
use crate::hub::BroadcastHub;
use crate::maintenance::{MaintenanceTrigger, TRIGGER_CONFIDENCE};
use crate::policy;
use crate::storage::FleetStore;
use crate::types::{ReadingPayload, TelemetryUpdate, Verdict};

use super::{IngestError, VerdictSink};

/// Combined primary outcome of one ingest call (steps 1-5 only).
#[derive(Debug, Clone, serde::Serialize)]
pub struct IngestOutcome {
    pub reading_id: u64,
    pub verdict_id: u64,
    pub vehicle_id: u64,
    pub failure: u8,
    pub confidence: f64,
    pub anomaly: bool,
    pub anomaly_score: f64,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// The ingestion pipeline. Shared across all producers; every collaborator
/// is either read-only after construction (ensemble) or internally
/// synchronized (store, hub), so concurrent `ingest` calls are safe.
pub struct IngestPipeline {
    store: FleetStore,
    verdicts: Arc<dyn VerdictSink>,
    ensemble: Arc<ModelEnsemble>,
    trigger: MaintenanceTrigger,
    hub: Arc<BroadcastHub>,
    /// Admission bound on concurrent ingests. The original design accepted
    /// unbounded fan-in; this makes the limit explicit and tunable.
    admission: Semaphore,
    /// Ingest calls completed (steps 1-5 succeeded)
    ingested: std::sync::atomic::AtomicU64,
}

impl IngestPipeline {
    pub fn new(
        store: FleetStore,
        ensemble: Arc<ModelEnsemble>,
        hub: Arc<BroadcastHub>,
        max_concurrent_ingests: usize,
    ) -> Self {
        let trigger = MaintenanceTrigger::new(store.clone());
        Self {
            verdicts: Arc::new(store.clone()),
            store,
            ensemble,
            trigger,
            hub,
            admission: Semaphore::new(max_concurrent_ingests.max(1)),
            ingested: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Redirect verdict persistence to a different sink.
    pub fn with_verdict_sink(mut self, sink: Arc<dyn VerdictSink>) -> Self {
        self.verdicts = sink;
        self
    }

    /// Total ingest calls that completed their primary outcome.
    pub fn ingested_count(&self) -> u64 {
        self.ingested.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// Run one reading through the full pipeline.
    ///
    /// Returns the combined primary outcome, or a typed failure from steps
    /// 1-5. Maintenance and broadcast side effects never influence the
    /// returned result.
    pub async fn ingest(&self, payload: ReadingPayload) -> Result<IngestOutcome, IngestError> {
        // Admission bound. The semaphore is never closed, so acquire only
        // returns Err after a close that cannot happen; holding the Option
        // keeps the permit alive for the duration of the call either way.
        let _permit = self.admission.acquire().await.ok();

        // STEP 1: existence check. Nothing is persisted for unknown vehicles.
        if !self.store.vehicle_exists(payload.vehicle_id)? {
            return Err(IngestError::VehicleNotFound(payload.vehicle_id));
        }

        // STEP 2: persist the reading with the pipeline's own clock. Any
        // timestamp a producer might embed in its raw payload is ignored.
        let now = Utc::now();
        let reading = self.store.insert_reading(&payload, now)?;
        debug!(
            vehicle_id = reading.vehicle_id,
            reading_id = reading.id,
            "Reading persisted"
        );

        // Registry bookkeeping; not part of the primary outcome.
        if let Err(e) = self.store.touch_vehicle(reading.vehicle_id, now) {
            warn!(vehicle_id = reading.vehicle_id, error = %e, "Failed to update last_seen");
        }

        // STEP 3: score from the persisted reading, not the raw payload.
        let features = reading.features();
        let (failure_pred, confidence) = self.ensemble.score_failure(&features);
        let (anomaly_flag, anomaly_score) = self.ensemble.score_anomaly(&features);

        // STEP 4: decision policy.
        let message = policy::decide(failure_pred, confidence, anomaly_flag, anomaly_score);

        // STEP 5: persist the verdict. On failure the reading stays - a
        // reading without a verdict is still valuable, so no rollback.
        let verdict = Verdict {
            id: self.store.next_id()?,
            vehicle_id: reading.vehicle_id,
            timestamp: Utc::now(),
            failure_prediction: failure_pred,
            failure_confidence: confidence,
            anomaly_flag,
            anomaly_score,
            message: message.to_string(),
        };
        self.verdicts.insert_verdict(&verdict)?;

        self.ingested
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        // STEP 6: maintenance trigger, best-effort.
        if failure_pred == 1 && confidence > TRIGGER_CONFIDENCE {
            if let Err(e) = self.trigger.trigger(reading.vehicle_id, confidence) {
                warn!(
                    vehicle_id = reading.vehicle_id,
                    error = %e,
                    "Maintenance trigger failed - ingest outcome unaffected"
                );
            }
        }

        // STEP 7: broadcast, fire-and-forget. The sweep itself cannot fail;
        // individual delivery failures are handled inside the hub.
        let delivered = self
            .hub
            .broadcast(&TelemetryUpdate::new(&reading, &verdict))
            .await;
        debug!(
            vehicle_id = reading.vehicle_id,
            delivered, "Broadcast sweep complete"
        );

        Ok(IngestOutcome {
            reading_id: reading.id,
            verdict_id: verdict.id,
            vehicle_id: reading.vehicle_id,
            failure: verdict.failure_prediction,
            confidence: verdict.failure_confidence,
            anomaly: verdict.anomaly_flag == 1,
            anomaly_score: verdict.anomaly_score,
            message: verdict.message,
            timestamp: verdict.timestamp,
        })
    }
}
