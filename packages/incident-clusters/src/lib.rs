//! Adaptive Incident Marker Clustering
//!
//! Turns a list of incident reports into a zoom-responsive, severity-weighted
//! cluster layer for an interactive map, without blocking the host's event
//! loop.
//!
//! # Flow
//!
//! ```text
//! reports ──► WeightCalculator (per point)
//!         ──► ChunkedIngestionPipeline (batched, yields between batches)
//!               configured by ZoomBandResolver (dataset tier x zoom)
//!         ──► ClusterLayer ──► ClusterVisualEncoder icons ──► MapHost
//!
//! zoom change ──► ZoomChangeReconciler ──► recluster | noop
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use incident_clusters::{ChunkedIngestionPipeline, ClusterEngine, PipelineSettings};
//!
//! let pipeline = ChunkedIngestionPipeline::new(PipelineSettings::default())?
//!     .with_listener(detail_panel);
//! let (engine, handle) = ClusterEngine::new(map_host, pipeline);
//! tokio::spawn(engine.run());
//!
//! handle.replace_points(filtered_reports);
//! handle.zoom_changed(15.0);
//! ```
//!
//! # Modules
//!
//! - [`weight`] - Per-point weight from severity, category and recency
//! - [`zoom`] - Dataset tiers and zoom-to-radius tables
//! - [`encoder`] - Cluster color and size encoding
//! - [`spatial`] - Grid clustering in Web Mercator pixel space
//! - [`layer`] - The cluster layer and its markers
//! - [`pipeline`] - Chunked ingestion and zoom reconciliation
//! - [`engine`] - Single owner of the active layer
//! - [`testing`] - Recording host and listener for tests

pub mod encoder;
pub mod engine;
pub mod error;
pub mod host;
pub mod layer;
pub mod pipeline;
pub mod popup;
pub mod spatial;
pub mod testing;
pub mod types;
pub mod weight;
pub mod zoom;

// Re-export core types at crate root
pub use encoder::ClusterVisualEncoder;
pub use engine::{ClusterEngine, EngineHandle, EngineState, ViewportEvent};
pub use error::{ClusterError, Result};
pub use host::{MapHost, Viewport};
pub use layer::{ClusterLayer, LayerId, LayerListener, Marker};
pub use pipeline::{
    ChunkedIngestionPipeline, Generation, GenerationCounter, IngestOutcome, ReclusterPlan,
    ReconcileDecision, ZoomChangeReconciler,
};
pub use popup::{build_popup, PopupContent, SeverityBadge};
pub use types::{
    cluster::{Cluster, IngestStats, RenderedMarkerIcon, Rgb, SizeTier},
    config::PipelineSettings,
    incident::{GeoBounds, IncidentPoint, IncidentReport, IncidentType, LatLng, Severity},
};
pub use weight::WeightCalculator;
pub use zoom::{ActiveBand, ClusteringConfig, DatasetTier, ZoomBand, ZoomBandResolver};
