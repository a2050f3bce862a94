//! The cluster layer attached to the map viewport.
//!
//! A layer owns its markers and the clusters computed from them. Cluster
//! aggregates are rebuilt from full membership whenever markers are added;
//! icons are computed on demand and never cached.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::encoder::ClusterVisualEncoder;
use crate::error::Result;
use crate::popup::{build_popup, PopupContent};
use crate::spatial::cluster_markers;
use crate::types::cluster::{Cluster, IngestStats, RenderedMarkerIcon};
use crate::types::incident::{GeoBounds, IncidentPoint, IncidentReport};
use crate::weight::WeightCalculator;
use crate::zoom::{ActiveBand, ClusteringConfig};

/// Identifier of a layer as seen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LayerId(Uuid);

impl LayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Host-side hooks for layer interaction.
///
/// Passed to the pipeline at construction and shared with every layer it builds.
pub trait LayerListener: Send + Sync {
    /// A marker was clicked; typically updates an external detail panel.
    fn on_marker_clicked(&self, marker: &Marker);

    /// A layer finished ingesting.
    fn on_ingest_complete(&self, _layer: LayerId, _stats: &IngestStats) {}
}

/// One accepted incident on the layer.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    /// Position in the source report order (after dropping invalid reports)
    pub index: usize,
    pub point: IncidentPoint,
    pub weight: f64,
    pub popup: PopupContent,
    pub icon: RenderedMarkerIcon,
}

impl Marker {
    /// Validate, weight and decorate one report.
    pub fn build(
        index: usize,
        report: &IncidentReport,
        weights: &WeightCalculator,
        animate: bool,
    ) -> Result<Self> {
        let point = IncidentPoint::from_report(report)?;
        let weight = weights.weight(&point);
        let icon = ClusterVisualEncoder::new(animate).encode(&[&point])?;
        let popup = build_popup(&point);
        Ok(Self {
            index,
            point,
            weight,
            popup,
            icon,
        })
    }

    pub fn id(&self) -> &str {
        &self.point.id
    }
}

/// A populated cluster layer.
pub struct ClusterLayer {
    id: LayerId,
    config: ClusteringConfig,
    band: ActiveBand,
    markers: Vec<Marker>,
    clusters: Vec<Cluster>,
    listener: Option<Arc<dyn LayerListener>>,
}

impl fmt::Debug for ClusterLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterLayer")
            .field("id", &self.id)
            .field("tier", &self.config.tier)
            .field("zoom", &self.band.zoom)
            .field("markers", &self.markers.len())
            .field("clusters", &self.clusters.len())
            .finish()
    }
}

impl ClusterLayer {
    /// Create an empty layer clustered at `zoom`.
    pub fn new(
        config: ClusteringConfig,
        zoom: f64,
        listener: Option<Arc<dyn LayerListener>>,
    ) -> Self {
        let band = config.active_band(zoom);
        Self {
            id: LayerId::new(),
            config,
            band,
            markers: Vec::new(),
            clusters: Vec::new(),
            listener,
        }
    }

    /// Append markers and rebuild clusters from the full membership.
    pub fn add_markers(&mut self, markers: impl IntoIterator<Item = Marker>) {
        let before = self.markers.len();
        self.markers.extend(markers);
        if self.markers.len() != before {
            self.clusters = cluster_markers(&self.markers, &self.band);
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    pub fn band(&self) -> &ActiveBand {
        &self.band
    }

    /// Zoom the current clusters were computed for.
    pub fn clustered_zoom(&self) -> f64 {
        self.band.zoom
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id() == id)
    }

    /// Markers belonging to a cluster.
    pub fn members<'a>(&'a self, cluster: &'a Cluster) -> impl Iterator<Item = &'a Marker> + 'a {
        cluster.members.iter().filter_map(|&i| self.markers.get(i))
    }

    /// Clusters paired with freshly encoded icons.
    pub fn rendered(&self) -> Vec<(&Cluster, RenderedMarkerIcon)> {
        let encoder = ClusterVisualEncoder::new(self.config.animate);
        self.clusters
            .iter()
            .filter_map(|c| encoder.encode_cluster(c).ok().map(|icon| (c, icon)))
            .collect()
    }

    /// Bounds of every marker, for viewport fitting.
    pub fn bounds(&self) -> Option<GeoBounds> {
        GeoBounds::from_positions(self.markers.iter().map(|m| m.point.position))
    }

    /// The report set this layer was built from, in original order.
    pub fn source_reports(&self) -> Vec<IncidentReport> {
        self.markers.iter().map(|m| m.point.to_report()).collect()
    }

    /// Forward a marker click to the listener. Returns `false` for unknown ids.
    pub fn click_marker(&self, id: &str) -> bool {
        let Some(marker) = self.marker(id) else {
            return false;
        };
        if let Some(listener) = &self.listener {
            listener.on_marker_clicked(marker);
        }
        true
    }

    pub(crate) fn listener(&self) -> Option<&Arc<dyn LayerListener>> {
        self.listener.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingListener, ReportFixture};
    use crate::types::incident::LatLng;

    fn layer_with(fixtures: Vec<ReportFixture>, listener: Option<Arc<dyn LayerListener>>) -> ClusterLayer {
        let calc = WeightCalculator::default();
        let config = ClusteringConfig::for_dataset(fixtures.len());
        let mut layer = ClusterLayer::new(config, 12.0, listener);
        layer.add_markers(
            fixtures
                .iter()
                .enumerate()
                .map(|(i, f)| Marker::build(i, &f.build(), &calc, true).unwrap()),
        );
        layer
    }

    #[test]
    fn test_marker_build_rejects_missing_coordinates() {
        let report = ReportFixture::at(12.9, 77.5).build().without_coordinates();
        let err = Marker::build(0, &report, &WeightCalculator::default(), true).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_bounds_and_counts() {
        let layer = layer_with(
            vec![ReportFixture::at(12.9, 77.5), ReportFixture::at(13.1, 77.7)],
            None,
        );
        assert_eq!(layer.marker_count(), 2);
        let bounds = layer.bounds().unwrap();
        assert_eq!(bounds.south_west, LatLng::new(12.9, 77.5));
        assert_eq!(bounds.north_east, LatLng::new(13.1, 77.7));
    }

    #[test]
    fn test_source_reports_round_trip_order() {
        let fixtures = vec![
            ReportFixture::at(12.9, 77.5).id("first"),
            ReportFixture::at(13.1, 77.7).id("second"),
        ];
        let expected: Vec<IncidentReport> = fixtures.iter().map(ReportFixture::build).collect();
        let layer = layer_with(fixtures, None);
        assert_eq!(layer.source_reports(), expected);
    }

    #[test]
    fn test_click_marker_notifies_listener() {
        let listener = Arc::new(RecordingListener::new());
        let layer = layer_with(
            vec![ReportFixture::at(12.9, 77.5).id("abc")],
            Some(listener.clone()),
        );
        assert!(layer.click_marker("abc"));
        assert!(!layer.click_marker("missing"));
        assert_eq!(listener.clicked(), vec!["abc".to_string()]);
    }

    #[test]
    fn test_rendered_icons_match_clusters() {
        let layer = layer_with(
            vec![
                ReportFixture::at(12.9716, 77.5946).severity(5),
                ReportFixture::at(12.9717, 77.5947).severity(4),
            ],
            None,
        );
        let rendered = layer.rendered();
        assert_eq!(rendered.len(), layer.cluster_count());
        let (cluster, icon) = rendered[0];
        assert_eq!(icon.label as usize, cluster.member_count);
        assert!(icon.is_high_severity_ring);
    }
}
