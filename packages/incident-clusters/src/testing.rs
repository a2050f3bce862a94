//! Testing utilities including mock host and listener implementations.
//!
//! Useful for exercising the engine without a real mapping library.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::host::{MapHost, Viewport};
use crate::layer::{ClusterLayer, LayerId, LayerListener, Marker};
use crate::types::cluster::IngestStats;
use crate::types::incident::{GeoBounds, IncidentReport, IncidentType};

/// Fixed clock used by fixtures.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Builder for incident reports in tests.
#[derive(Debug, Clone)]
pub struct ReportFixture {
    report: IncidentReport,
}

impl ReportFixture {
    /// A severity-3 harassment report from yesterday at `(lat, lng)`.
    pub fn at(lat: f64, lng: f64) -> Self {
        Self {
            report: IncidentReport::new(
                format!("report-{lat:.5}-{lng:.5}"),
                lat,
                lng,
                3,
                IncidentType::Harassment,
                fixture_now() - Duration::days(1),
            ),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.report.id = id.into();
        self
    }

    pub fn severity(mut self, severity: u8) -> Self {
        self.report.severity = severity;
        self
    }

    pub fn kind(mut self, incident_type: IncidentType) -> Self {
        self.report.incident_type = incident_type;
        self
    }

    pub fn days_ago(mut self, days: i64) -> Self {
        self.report.occurred_at = fixture_now() - Duration::days(days);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.report.description = Some(description.into());
        self
    }

    pub fn no_coordinates(mut self) -> Self {
        self.report.coordinates = None;
        self
    }

    pub fn build(&self) -> IncidentReport {
        self.report.clone()
    }
}

/// `count` valid reports spread over a grid around Bengaluru, with unique ids.
pub fn grid_reports(count: usize) -> Vec<IncidentReport> {
    (0..count)
        .map(|i| {
            let row = (i / 50) as f64;
            let col = (i % 50) as f64;
            ReportFixture::at(12.80 + row * 0.004, 77.45 + col * 0.004)
                .id(format!("grid-{i}"))
                .severity((i % 5) as u8 + 1)
                .kind(IncidentType::ALL[i % IncidentType::ALL.len()])
                .build()
        })
        .collect()
}

/// Record of a call made to the recording host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    AddLayer { layer: LayerId, markers: usize, zoom: f64 },
    RemoveLayer { layer: LayerId },
    FitBounds { bounds: GeoBounds },
}

/// A [`MapHost`] that records every call for assertions.
///
/// Clones share the same call log and viewport.
#[derive(Debug, Clone)]
pub struct RecordingHost {
    viewport: Arc<RwLock<Viewport>>,
    calls: Arc<RwLock<Vec<HostCall>>>,
}

impl RecordingHost {
    pub fn new(zoom: f64) -> Self {
        Self {
            viewport: Arc::new(RwLock::new(Viewport::at_zoom(zoom))),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Simulate the user zooming the map.
    pub fn set_zoom(&self, zoom: f64) {
        self.viewport.write().unwrap().zoom = zoom;
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.read().unwrap().clone()
    }

    /// Layers currently attached, in attach order.
    pub fn attached(&self) -> Vec<LayerId> {
        let mut attached = Vec::new();
        for call in self.calls.read().unwrap().iter() {
            match call {
                HostCall::AddLayer { layer, .. } => attached.push(*layer),
                HostCall::RemoveLayer { layer } => attached.retain(|l| l != layer),
                HostCall::FitBounds { .. } => {}
            }
        }
        attached
    }

    pub fn add_count(&self) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, HostCall::AddLayer { .. }))
            .count()
    }
}

impl MapHost for RecordingHost {
    fn viewport(&self) -> Viewport {
        *self.viewport.read().unwrap()
    }

    fn add_layer(&mut self, layer: &ClusterLayer) {
        self.calls.write().unwrap().push(HostCall::AddLayer {
            layer: layer.id(),
            markers: layer.marker_count(),
            zoom: layer.clustered_zoom(),
        });
    }

    fn remove_layer(&mut self, layer: LayerId) {
        self.calls
            .write()
            .unwrap()
            .push(HostCall::RemoveLayer { layer });
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        self.viewport.write().unwrap().bounds = Some(bounds);
        self.calls
            .write()
            .unwrap()
            .push(HostCall::FitBounds { bounds });
    }
}

/// A [`LayerListener`] that records clicks and completed ingestions.
#[derive(Debug, Default)]
pub struct RecordingListener {
    clicked: RwLock<Vec<String>>,
    completed: RwLock<Vec<(LayerId, IngestStats)>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of clicked markers, in click order.
    pub fn clicked(&self) -> Vec<String> {
        self.clicked.read().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<(LayerId, IngestStats)> {
        self.completed.read().unwrap().clone()
    }
}

impl LayerListener for RecordingListener {
    fn on_marker_clicked(&self, marker: &Marker) {
        self.clicked.write().unwrap().push(marker.id().to_string());
    }

    fn on_ingest_complete(&self, layer: LayerId, stats: &IngestStats) {
        self.completed.write().unwrap().push((layer, stats.clone()));
    }
}
