//! Chunked ingestion pipeline - build a cluster layer in batches.
//!
//! Reports are validated, weighted and added to the layer `batch_size` at a
//! time. Between batches the pipeline yields to the runtime so a large
//! dataset never blocks the host's event loop. Ingestion never returns an
//! error: bad reports are dropped, failing batches are cut short, and a
//! superseded run simply stops.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::layer::{ClusterLayer, LayerListener, Marker};
use crate::pipeline::generation::{Generation, GenerationCounter};
use crate::types::cluster::IngestStats;
use crate::types::config::PipelineSettings;
use crate::types::incident::IncidentReport;
use crate::weight::WeightCalculator;
use crate::zoom::ClusteringConfig;

/// Result of an ingest operation.
#[derive(Debug)]
pub enum IngestOutcome {
    /// Every batch ran; the layer is ready to attach.
    Completed {
        layer: ClusterLayer,
        stats: IngestStats,
    },

    /// A newer request started; remaining batches were abandoned.
    Superseded { generation: u64, processed: usize },
}

impl IngestOutcome {
    pub fn is_superseded(&self) -> bool {
        matches!(self, IngestOutcome::Superseded { .. })
    }

    pub fn into_layer(self) -> Option<(ClusterLayer, IngestStats)> {
        match self {
            IngestOutcome::Completed { layer, stats } => Some((layer, stats)),
            IngestOutcome::Superseded { .. } => None,
        }
    }
}

/// Builds cluster layers from report sets.
#[derive(Clone)]
pub struct ChunkedIngestionPipeline {
    settings: PipelineSettings,
    generations: GenerationCounter,
    listener: Option<Arc<dyn LayerListener>>,
}

impl ChunkedIngestionPipeline {
    /// Create a pipeline, rejecting unusable settings.
    pub fn new(settings: PipelineSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            generations: GenerationCounter::new(),
            listener: None,
        })
    }

    /// Attach host interaction hooks to every layer this pipeline builds.
    pub fn with_listener(mut self, listener: Arc<dyn LayerListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Share a generation counter with another owner.
    pub fn with_generations(mut self, generations: GenerationCounter) -> Self {
        self.generations = generations;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn generations(&self) -> &GenerationCounter {
        &self.generations
    }

    /// Ingest as a new request, superseding any in-flight ingestion.
    pub async fn ingest(
        &self,
        reports: &[IncidentReport],
        config: &ClusteringConfig,
        zoom: f64,
    ) -> IngestOutcome {
        let generation = self.generations.begin();
        self.ingest_as(reports, config, zoom, generation).await
    }

    /// Ingest under a ticket taken earlier (e.g. when the request was queued).
    pub async fn ingest_as(
        &self,
        reports: &[IncidentReport],
        config: &ClusteringConfig,
        zoom: f64,
        generation: Generation,
    ) -> IngestOutcome {
        let started = Instant::now();
        let weights = WeightCalculator::new(Utc::now());
        let batch_size = self.settings.batch_size.max(1);
        let batch_count = reports.len().div_ceil(batch_size);

        let mut layer = ClusterLayer::new(config.clone(), zoom, self.listener.clone());
        let mut stats = IngestStats::default();
        let mut processed = 0;

        debug!(
            generation = generation.value(),
            reports = reports.len(),
            batches = batch_count,
            tier = config.tier.as_str(),
            zoom,
            "Starting chunked ingestion"
        );

        for (batch_index, batch) in reports.chunks(batch_size).enumerate() {
            if !generation.is_current() {
                debug!(
                    generation = generation.value(),
                    processed, "Ingestion superseded, abandoning remaining batches"
                );
                return IngestOutcome::Superseded {
                    generation: generation.value(),
                    processed,
                };
            }

            let markers = self.build_batch(batch_index, batch, &layer, &weights, config, &mut stats);
            layer.add_markers(markers);
            stats.batches += 1;
            processed += batch.len();

            if batch_index + 1 < batch_count {
                self.yield_to_host().await;
            }
        }

        if !generation.is_current() {
            debug!(
                generation = generation.value(),
                processed, "Ingestion superseded after final batch"
            );
            return IngestOutcome::Superseded {
                generation: generation.value(),
                processed,
            };
        }

        let stats = stats.with_totals(layer.cluster_count(), layer.marker_count());
        info!(
            layer = %layer.id(),
            total_clusters = stats.total_clusters,
            total_markers = stats.total_markers,
            average_cluster_size = stats.average_cluster_size,
            dropped_invalid = stats.dropped_invalid,
            failed_batches = stats.failed_batches,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ingestion complete"
        );

        if let Some(listener) = layer.listener() {
            listener.on_ingest_complete(layer.id(), &stats);
        }

        IngestOutcome::Completed { layer, stats }
    }

    /// Build markers for one batch.
    ///
    /// Malformed reports are dropped and the batch continues; any other
    /// failure skips the rest of the batch.
    fn build_batch(
        &self,
        batch_index: usize,
        batch: &[IncidentReport],
        layer: &ClusterLayer,
        weights: &WeightCalculator,
        config: &ClusteringConfig,
        stats: &mut IngestStats,
    ) -> Vec<Marker> {
        let mut markers = Vec::with_capacity(batch.len());

        for (offset, report) in batch.iter().enumerate() {
            let index = layer.marker_count() + markers.len();
            match Marker::build(index, report, weights, config.animate) {
                Ok(marker) => markers.push(marker),
                Err(e) if e.is_malformed_input() => {
                    stats.dropped_invalid += 1;
                    debug!(report = %report.id, error = %e, "Dropping malformed report");
                }
                Err(e) => {
                    let skipped = batch.len() - offset;
                    stats.skipped_by_failure += skipped;
                    stats.failed_batches += 1;
                    warn!(
                        batch = batch_index,
                        report = %report.id,
                        skipped,
                        error = %e,
                        "Batch failed, skipping its remaining reports"
                    );
                    break;
                }
            }
        }

        markers
    }

    async fn yield_to_host(&self) {
        let delay = self.settings.yield_delay();
        if delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(delay).await;
        }
    }
}
