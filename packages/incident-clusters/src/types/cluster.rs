//! Cluster aggregates and the icons rendered for them.

use serde::Serialize;

use super::incident::{IncidentType, LatLng};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Subtract `offset` from every channel, floored at 0.
    pub fn darken(self, offset: u8) -> Self {
        Self::new(
            self.r.saturating_sub(offset),
            self.g.saturating_sub(offset),
            self.b.saturating_sub(offset),
        )
    }

    /// Add `offset` to every channel, capped at 255.
    pub fn lighten(self, offset: u8) -> Self {
        Self::new(
            self.r.saturating_add(offset),
            self.g.saturating_add(offset),
            self.b.saturating_add(offset),
        )
    }

    /// `#rrggbb` form for templating.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Pixel sizing for one cluster size tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeTier {
    pub diameter_px: u32,
    pub font_size_px: u32,
    pub ring_width_px: u32,
}

/// Icon description for a cluster or single marker.
///
/// A pure function of the cluster it was computed from; never cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderedMarkerIcon {
    pub size: SizeTier,
    pub color: Rgb,
    pub is_high_severity_ring: bool,
    /// Pulsing accent; only set when the ring is shown and animation is enabled.
    pub pulse: bool,
    pub label: u32,
}

impl RenderedMarkerIcon {
    pub fn size_px(&self) -> u32 {
        self.size.diameter_px
    }
}

/// Transient aggregate of markers grouped at the clustered zoom.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub centroid: LatLng,
    pub member_weight_sum: f64,
    pub member_count: usize,
    pub dominant_type: IncidentType,
    pub average_severity: f64,
    /// Indices into the owning layer's marker list.
    pub members: Vec<usize>,
}

impl Cluster {
    pub fn is_single(&self) -> bool {
        self.member_count == 1
    }

    pub fn average_weight(&self) -> f64 {
        if self.member_count == 0 {
            0.0
        } else {
            self.member_weight_sum / self.member_count as f64
        }
    }
}

/// Summary emitted when an ingestion completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestStats {
    pub total_clusters: usize,
    pub total_markers: usize,
    pub average_cluster_size: f64,

    /// Reports dropped for missing or invalid coordinates
    pub dropped_invalid: usize,

    /// Failing reports plus the rest of their batch
    pub skipped_by_failure: usize,

    pub failed_batches: usize,
    pub batches: usize,
}

impl IngestStats {
    /// Fill the cluster totals from the finished layer's counts.
    pub fn with_totals(mut self, total_clusters: usize, total_markers: usize) -> Self {
        self.total_clusters = total_clusters;
        self.total_markers = total_markers;
        self.average_cluster_size = if total_clusters == 0 {
            0.0
        } else {
            total_markers as f64 / total_clusters as f64
        };
        self
    }

    pub fn is_complete(&self) -> bool {
        self.failed_batches == 0
    }
}
