//! Cluster color and size encoding.
//!
//! Color starts from the dominant category's palette entry and is darkened
//! for dangerous concentrations (average severity >= 4) or lightened for
//! mild ones (<= 2). Size steps with member count.

use std::collections::HashMap;

use crate::error::{ClusterError, Result};
use crate::types::cluster::{Cluster, RenderedMarkerIcon, Rgb, SizeTier};
use crate::types::incident::{IncidentPoint, IncidentType};

/// Per-channel offset applied when darkening or lightening.
pub const INTENSITY_OFFSET: u8 = 40;

/// Average severity at or above which a cluster is flagged as dangerous.
pub const HIGH_SEVERITY: f64 = 4.0;

/// Average severity at or below which a cluster is drawn lighter.
pub const LOW_SEVERITY: f64 = 2.0;

const SIZE_TIERS: [(usize, SizeTier); 6] = [
    (100, tier(64, 16, 5)),
    (50, tier(56, 15, 4)),
    (20, tier(48, 14, 4)),
    (10, tier(42, 13, 3)),
    (5, tier(36, 12, 3)),
    (0, tier(30, 11, 2)),
];

const fn tier(diameter_px: u32, font_size_px: u32, ring_width_px: u32) -> SizeTier {
    SizeTier {
        diameter_px,
        font_size_px,
        ring_width_px,
    }
}

/// Fixed palette entry per category.
pub fn base_color(incident_type: IncidentType) -> Rgb {
    match incident_type {
        IncidentType::TeenGang => Rgb::new(220, 38, 38),
        IncidentType::ChainSnatching => Rgb::new(234, 88, 12),
        IncidentType::Harassment => Rgb::new(147, 51, 234),
        IncidentType::Other => Rgb::new(107, 114, 128),
    }
}

/// Size tier for a member count: >=100, >=50, >=20, >=10, >=5, else smallest.
pub fn size_tier(member_count: usize) -> SizeTier {
    SIZE_TIERS
        .iter()
        .find(|(min, _)| member_count >= *min)
        .map(|(_, size)| *size)
        .unwrap_or(SIZE_TIERS[SIZE_TIERS.len() - 1].1)
}

/// Category with the most members.
///
/// Equal counts resolve to the category declared first in [`IncidentType`]
/// (the more dangerous one), so the result never depends on member order.
pub fn dominant_type<I>(types: I) -> Option<IncidentType>
where
    I: IntoIterator<Item = IncidentType>,
{
    let mut counts: HashMap<IncidentType, usize> = HashMap::new();
    for t in types {
        *counts.entry(t).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a_type, a_count), (b_type, b_count)| {
            a_count.cmp(b_count).then_with(|| b_type.cmp(a_type))
        })
        .map(|(t, _)| t)
}

/// Apply the severity-driven intensity rule to a base color.
pub fn intensity(base: Rgb, average_severity: f64) -> Rgb {
    if average_severity >= HIGH_SEVERITY {
        base.darken(INTENSITY_OFFSET)
    } else if average_severity <= LOW_SEVERITY {
        base.lighten(INTENSITY_OFFSET)
    } else {
        base
    }
}

/// Stateless icon encoder.
#[derive(Debug, Clone, Copy)]
pub struct ClusterVisualEncoder {
    animate: bool,
}

impl Default for ClusterVisualEncoder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ClusterVisualEncoder {
    pub fn new(animate: bool) -> Self {
        Self { animate }
    }

    /// Encode an icon from the member points of a cluster.
    pub fn encode(&self, members: &[&IncidentPoint]) -> Result<RenderedMarkerIcon> {
        let dominant =
            dominant_type(members.iter().map(|p| p.incident_type)).ok_or(ClusterError::EmptyCluster)?;
        let severity_sum: u32 = members.iter().map(|p| u32::from(p.severity.value())).sum();
        let average_severity = f64::from(severity_sum) / members.len() as f64;
        Ok(self.icon(dominant, average_severity, members.len()))
    }

    /// Encode an icon from an already aggregated cluster.
    pub fn encode_cluster(&self, cluster: &Cluster) -> Result<RenderedMarkerIcon> {
        if cluster.member_count == 0 {
            return Err(ClusterError::EmptyCluster);
        }
        Ok(self.icon(
            cluster.dominant_type,
            cluster.average_severity,
            cluster.member_count,
        ))
    }

    fn icon(
        &self,
        dominant: IncidentType,
        average_severity: f64,
        member_count: usize,
    ) -> RenderedMarkerIcon {
        let is_high_severity_ring = average_severity >= HIGH_SEVERITY;
        RenderedMarkerIcon {
            size: size_tier(member_count),
            color: intensity(base_color(dominant), average_severity),
            is_high_severity_ring,
            pulse: is_high_severity_ring && self.animate,
            label: member_count as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::incident::{LatLng, Severity};
    use chrono::Utc;

    fn point(incident_type: IncidentType, severity: u8) -> IncidentPoint {
        IncidentPoint {
            id: "p".into(),
            position: LatLng::new(12.97, 77.59),
            severity: Severity::new(severity).unwrap(),
            incident_type,
            occurred_at: Utc::now(),
            description: None,
        }
    }

    #[test]
    fn test_mixed_cluster_scenario() {
        let members = [
            point(IncidentType::TeenGang, 5),
            point(IncidentType::TeenGang, 5),
            point(IncidentType::TeenGang, 4),
            point(IncidentType::Other, 1),
        ];
        let refs: Vec<&IncidentPoint> = members.iter().collect();
        let icon = ClusterVisualEncoder::default().encode(&refs).unwrap();

        // Average 3.75 sits in the unmodified band and below the ring threshold.
        assert_eq!(icon.color, base_color(IncidentType::TeenGang));
        assert!(!icon.is_high_severity_ring);
        assert!(!icon.pulse);
        assert_eq!(icon.label, 4);
        assert_eq!(icon.size, size_tier(4));
    }

    #[test]
    fn test_severity_boundaries() {
        let base = Rgb::new(100, 100, 100);
        assert_eq!(intensity(base, 4.0), Rgb::new(60, 60, 60));
        assert_eq!(intensity(base, 2.0), Rgb::new(140, 140, 140));
        assert_eq!(intensity(base, 3.99), base);
        assert_eq!(intensity(base, 2.01), base);
    }

    #[test]
    fn test_ring_at_exactly_four() {
        let members = [point(IncidentType::Harassment, 4), point(IncidentType::Harassment, 4)];
        let refs: Vec<&IncidentPoint> = members.iter().collect();

        let icon = ClusterVisualEncoder::new(true).encode(&refs).unwrap();
        assert!(icon.is_high_severity_ring);
        assert!(icon.pulse);

        let icon = ClusterVisualEncoder::new(false).encode(&refs).unwrap();
        assert!(icon.is_high_severity_ring);
        assert!(!icon.pulse);
    }

    #[test]
    fn test_size_tiers_step_with_count() {
        assert_eq!(size_tier(1).diameter_px, 30);
        assert_eq!(size_tier(4).diameter_px, 30);
        assert_eq!(size_tier(5).diameter_px, 36);
        assert_eq!(size_tier(10).diameter_px, 42);
        assert_eq!(size_tier(20).diameter_px, 48);
        assert_eq!(size_tier(50).diameter_px, 56);
        assert_eq!(size_tier(100).diameter_px, 64);
        assert_eq!(size_tier(5000).diameter_px, 64);
    }

    #[test]
    fn test_dominant_type_tie_is_order_independent() {
        let forward = dominant_type([IncidentType::Other, IncidentType::Harassment]);
        let reverse = dominant_type([IncidentType::Harassment, IncidentType::Other]);
        assert_eq!(forward, Some(IncidentType::Harassment));
        assert_eq!(forward, reverse);
        assert_eq!(dominant_type(std::iter::empty()), None);
    }

    #[test]
    fn test_encode_is_deterministic() {
        let members = [
            point(IncidentType::ChainSnatching, 2),
            point(IncidentType::Other, 3),
            point(IncidentType::ChainSnatching, 1),
        ];
        let refs: Vec<&IncidentPoint> = members.iter().collect();
        let encoder = ClusterVisualEncoder::default();
        assert_eq!(encoder.encode(&refs).unwrap(), encoder.encode(&refs).unwrap());
    }

    #[test]
    fn test_empty_cluster_is_an_error() {
        assert!(matches!(
            ClusterVisualEncoder::default().encode(&[]),
            Err(ClusterError::EmptyCluster)
        ));
    }
}
