//! Ingestion pipeline and zoom reconciliation.
//!
//! The pipeline orchestrates:
//! - Batched insertion of reports into a cluster layer, yielding between batches
//! - Supersession of stale ingestions via generation tickets
//! - Reconciliation of viewport zoom changes into recluster decisions

pub mod generation;
pub mod ingest;
pub mod reconcile;

pub use generation::{Generation, GenerationCounter};
pub use ingest::{ChunkedIngestionPipeline, IngestOutcome};
pub use reconcile::{ReclusterPlan, ReconcileDecision, ZoomChangeReconciler};
