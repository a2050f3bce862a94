//! Engine that owns the active cluster layer.
//!
//! The engine is the single writer of the layer attached to the host
//! viewport. Everything else talks to it through an [`EngineHandle`], which
//! queues viewport events on a channel.
//!
//! # States
//!
//! - **Idle**: no ingestion running (a layer may or may not be attached)
//! - **Ingesting**: batches are being inserted; queued events wait
//!
//! When ingestion finishes, queued events are coalesced: the newest point set
//! and the newest zoom are honored, older ones are discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::host::MapHost;
use crate::layer::ClusterLayer;
use crate::pipeline::{
    ChunkedIngestionPipeline, Generation, GenerationCounter, IngestOutcome, ReconcileDecision,
    ZoomChangeReconciler,
};
use crate::types::cluster::IngestStats;
use crate::types::incident::IncidentReport;
use crate::zoom::{ClusteringConfig, ZoomBandResolver};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Idle,
    Ingesting,
}

/// Event queued for the engine.
#[derive(Debug, Clone)]
pub enum ViewportEvent {
    /// The filtering layer produced a new report set.
    PointsReplaced {
        reports: Arc<Vec<IncidentReport>>,
        generation: Generation,
    },

    /// The host viewport settled on a new zoom.
    ZoomChanged { zoom: f64 },
}

/// Cloneable sender side of the engine.
#[derive(Clone)]
pub struct EngineHandle {
    events: mpsc::UnboundedSender<ViewportEvent>,
    generations: GenerationCounter,
    ingesting: Arc<AtomicBool>,
}

impl EngineHandle {
    /// Queue a new report set.
    ///
    /// Takes a generation ticket immediately, so an ingestion already in
    /// flight stops at its next batch boundary. Returns `false` if the engine
    /// has stopped.
    pub fn replace_points(&self, reports: Vec<IncidentReport>) -> bool {
        let generation = self.generations.begin();
        self.events
            .send(ViewportEvent::PointsReplaced {
                reports: Arc::new(reports),
                generation,
            })
            .is_ok()
    }

    /// Queue a viewport zoom change.
    pub fn zoom_changed(&self, zoom: f64) -> bool {
        self.events.send(ViewportEvent::ZoomChanged { zoom }).is_ok()
    }

    pub fn is_ingesting(&self) -> bool {
        self.ingesting.load(Ordering::SeqCst)
    }
}

/// Owner of the active layer, the host and the pipeline.
pub struct ClusterEngine<H: MapHost> {
    host: H,
    pipeline: ChunkedIngestionPipeline,
    reconciler: ZoomChangeReconciler,
    resolver: ZoomBandResolver,
    active: Option<ClusterLayer>,
    state: EngineState,
    ingesting: Arc<AtomicBool>,
    viewport_zoom: f64,
    last_stats: Option<IngestStats>,
    events: mpsc::UnboundedReceiver<ViewportEvent>,
}

impl<H: MapHost> ClusterEngine<H> {
    pub fn new(host: H, pipeline: ChunkedIngestionPipeline) -> (Self, EngineHandle) {
        let (sender, events) = mpsc::unbounded_channel();
        let ingesting = Arc::new(AtomicBool::new(false));
        let handle = EngineHandle {
            events: sender,
            generations: pipeline.generations().clone(),
            ingesting: ingesting.clone(),
        };
        let viewport_zoom = host.viewport().zoom;

        let engine = Self {
            reconciler: ZoomChangeReconciler::from_settings(pipeline.settings()),
            resolver: ZoomBandResolver::new(),
            host,
            pipeline,
            active: None,
            state: EngineState::Idle,
            ingesting,
            viewport_zoom,
            last_stats: None,
            events,
        };
        (engine, handle)
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn active_layer(&self) -> Option<&ClusterLayer> {
        self.active.as_ref()
    }

    pub fn last_stats(&self) -> Option<&IngestStats> {
        self.last_stats.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Ingest a report set at the host's current zoom, replacing the active layer.
    pub async fn load(&mut self, reports: Vec<IncidentReport>) -> Option<&IngestStats> {
        let generation = self.pipeline.generations().begin();
        let zoom = self.host.viewport().zoom;
        self.viewport_zoom = zoom;
        let config = self.resolver.config_for(reports.len());
        self.ingest(&reports, config, zoom, generation).await
    }

    /// Reconcile a zoom change, reclustering when it is significant.
    pub async fn on_zoom_changed(&mut self, zoom: f64) -> ReconcileDecision {
        let previous = self.viewport_zoom;
        self.viewport_zoom = zoom;

        let decision = self
            .reconciler
            .on_zoom_changed(previous, zoom, self.active.as_ref());

        let plan = match (decision, self.active.as_ref()) {
            (ReconcileDecision::Recluster { zoom }, Some(layer)) => {
                info!(
                    from = layer.clustered_zoom(),
                    to = zoom,
                    markers = layer.marker_count(),
                    "Reclustering for zoom change"
                );
                Some(self.reconciler.plan(layer, zoom))
            }
            _ => None,
        };

        if let Some(plan) = plan {
            // Joins the current request so a queued point set stays current.
            let generation = self.pipeline.generations().join();
            self.ingest(&plan.reports, plan.config, plan.zoom, generation)
                .await;
        }

        decision
    }

    /// Fit the host viewport to the active layer. Returns `false` when there is nothing to fit.
    pub fn fit_to_layer(&mut self) -> bool {
        match self.active.as_ref().and_then(ClusterLayer::bounds) {
            Some(bounds) => {
                self.host.fit_bounds(bounds);
                true
            }
            None => false,
        }
    }

    /// Forward a marker click on the active layer.
    pub fn click_marker(&self, id: &str) -> bool {
        self.active
            .as_ref()
            .map(|layer| layer.click_marker(id))
            .unwrap_or(false)
    }

    /// Process events until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            let mut queued = vec![event];
            while let Ok(next) = self.events.try_recv() {
                queued.push(next);
            }
            self.apply(queued).await;
        }
        debug!("Viewport event channel closed, engine stopping");
    }

    /// Process whatever is queued right now. Returns the number of events consumed.
    pub async fn process_pending(&mut self) -> usize {
        let mut queued = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            queued.push(event);
        }
        let count = queued.len();
        if count > 0 {
            self.apply(queued).await;
        }
        count
    }

    async fn apply(&mut self, queued: Vec<ViewportEvent>) {
        let received = queued.len();
        let mut latest_points = None;
        let mut latest_zoom = None;

        for event in queued {
            match event {
                ViewportEvent::PointsReplaced {
                    reports,
                    generation,
                } => latest_points = Some((reports, generation)),
                ViewportEvent::ZoomChanged { zoom } => latest_zoom = Some(zoom),
            }
        }

        if received > 1 {
            debug!(received, "Coalesced queued viewport events");
        }

        if let Some((reports, generation)) = latest_points {
            if generation.is_current() {
                let zoom = latest_zoom.unwrap_or(self.viewport_zoom);
                self.viewport_zoom = zoom;
                let config = self.resolver.config_for(reports.len());
                self.ingest(&reports[..], config, zoom, generation).await;
                return;
            }
            debug!(
                generation = generation.value(),
                "Skipping point set superseded before it started"
            );
        }

        if let Some(zoom) = latest_zoom {
            self.on_zoom_changed(zoom).await;
        }
    }

    async fn ingest(
        &mut self,
        reports: &[IncidentReport],
        config: ClusteringConfig,
        zoom: f64,
        generation: Generation,
    ) -> Option<&IngestStats> {
        self.detach();
        self.set_state(EngineState::Ingesting);
        let outcome = self
            .pipeline
            .ingest_as(reports, &config, zoom, generation)
            .await;
        self.set_state(EngineState::Idle);

        match outcome {
            IngestOutcome::Completed { layer, stats } => {
                self.host.add_layer(&layer);
                self.active = Some(layer);
                self.last_stats = Some(stats);
                self.last_stats.as_ref()
            }
            IngestOutcome::Superseded { .. } => None,
        }
    }

    fn detach(&mut self) {
        if let Some(layer) = self.active.take() {
            debug!(layer = %layer.id(), "Detaching previous layer");
            self.host.remove_layer(layer.id());
        }
    }

    fn set_state(&mut self, state: EngineState) {
        self.state = state;
        self.ingesting
            .store(state == EngineState::Ingesting, Ordering::SeqCst);
    }
}
