//! Zoom-change reconciliation.
//!
//! A recluster is expensive and visually jittery, so single zoom steps are
//! absorbed: the decision compares the new zoom with the zoom the active
//! layer was clustered at, and only a distance of at least the threshold
//! (2 levels by default) triggers a rebuild. Several unit steps therefore
//! add up to exactly one recluster.

use serde::Serialize;
use tracing::debug;

use crate::layer::ClusterLayer;
use crate::types::config::PipelineSettings;
use crate::types::incident::IncidentReport;
use crate::zoom::ClusteringConfig;

/// Tolerance for fractional zoom levels reported by the host.
const ZOOM_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum ReconcileDecision {
    Recluster { zoom: f64 },
    Noop,
}

impl ReconcileDecision {
    pub fn is_recluster(&self) -> bool {
        matches!(self, ReconcileDecision::Recluster { .. })
    }
}

/// Everything needed to rebuild a layer at a new zoom.
#[derive(Debug, Clone)]
pub struct ReclusterPlan {
    pub reports: Vec<IncidentReport>,
    pub config: ClusteringConfig,
    pub zoom: f64,
}

/// Decides whether a zoom change warrants a full recluster.
#[derive(Debug, Clone, Copy)]
pub struct ZoomChangeReconciler {
    threshold: f64,
}

impl Default for ZoomChangeReconciler {
    fn default() -> Self {
        Self::new(PipelineSettings::default().recluster_threshold)
    }
}

impl ZoomChangeReconciler {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_settings(settings: &PipelineSettings) -> Self {
        Self::new(settings.recluster_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Pure decision; no layer means nothing to recluster.
    ///
    /// The threshold is measured from the zoom the layer was clustered at,
    /// not from `previous_zoom`, which is only logged.
    pub fn on_zoom_changed(
        &self,
        previous_zoom: f64,
        current_zoom: f64,
        active_layer: Option<&ClusterLayer>,
    ) -> ReconcileDecision {
        let Some(layer) = active_layer else {
            debug!(previous_zoom, current_zoom, "Zoom changed with no active layer");
            return ReconcileDecision::Noop;
        };

        let clustered_zoom = layer.clustered_zoom();
        let distance = (current_zoom - clustered_zoom).abs();
        let decision = if distance + ZOOM_EPSILON >= self.threshold {
            ReconcileDecision::Recluster { zoom: current_zoom }
        } else {
            ReconcileDecision::Noop
        };

        debug!(
            previous_zoom,
            current_zoom,
            clustered_zoom,
            distance,
            recluster = decision.is_recluster(),
            "Reconciled zoom change"
        );
        decision
    }

    /// Recover the layer's point set for a rebuild at `zoom`.
    ///
    /// The dataset tier was chosen once when the layer was first built and
    /// carries over unchanged.
    pub fn plan(&self, layer: &ClusterLayer, zoom: f64) -> ReclusterPlan {
        ReclusterPlan {
            reports: layer.source_reports(),
            config: layer.config().clone(),
            zoom,
        }
    }
}
