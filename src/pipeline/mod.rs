//! Telemetry Ingestion & Inference Pipeline
//!
//! ```text
//! STEP 1: Vehicle existence check        (fatal: VehicleNotFound)
//! STEP 2: Persist Reading                (fatal: Storage)
//! STEP 3: Feature vector + ensemble      (degrades to defaults, never fatal)
//! STEP 4: Decision policy                (pure)
//! STEP 5: Persist Verdict                (fatal: Storage; Reading stays)
//! STEP 6: Maintenance trigger            (best-effort, logged only)
//! STEP 7: Broadcast to observers         (best-effort, swallowed)
//! ```
//!
//! The caller's result reflects exactly steps 1-5; steps 6-7 are side
//! effects whose failure is invisible to the caller. Both run inline on the
//! ingest task rather than as spawned tasks: containment is by result
//! handling, and broadcast delivery is non-blocking (`try_send`), so inline
//! dispatch never stalls the caller.

mod ingest;

pub use ingest::{IngestOutcome, IngestPipeline};

use thiserror::Error;

use crate::storage::{FleetStore, StorageError};
use crate::types::Verdict;

/// Destination for persisted verdicts. [`FleetStore`] is the production
/// sink; the seam lets tests exercise a verdict-write failure, which the
/// concrete store cannot produce on demand.
pub trait VerdictSink: Send + Sync {
    fn insert_verdict(&self, verdict: &Verdict) -> Result<(), StorageError>;
}

impl VerdictSink for FleetStore {
    fn insert_verdict(&self, verdict: &Verdict) -> Result<(), StorageError> {
        FleetStore::insert_verdict(self, verdict)
    }
}

/// Typed failure for one ingest call.
///
/// Model unavailability is deliberately absent: a degraded ensemble
/// produces defaulted scores, not an error.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("vehicle {0} not found")]
    VehicleNotFound(u64),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
