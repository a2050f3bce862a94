//! Incident reports as delivered by the filtering layer, and the validated
//! points the engine clusters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};

/// Incident category.
///
/// Variants are declared in danger order; that order is also the tie-break
/// used when two categories have the same member count in a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentType {
    TeenGang,
    ChainSnatching,
    Harassment,
    #[serde(other)]
    Other,
}

impl IncidentType {
    pub const ALL: [IncidentType; 4] = [
        IncidentType::TeenGang,
        IncidentType::ChainSnatching,
        IncidentType::Harassment,
        IncidentType::Other,
    ];

    /// Human-readable label used in popups.
    pub fn label(&self) -> &'static str {
        match self {
            IncidentType::TeenGang => "Teen Gang",
            IncidentType::ChainSnatching => "Chain Snatching",
            IncidentType::Harassment => "Harassment",
            IncidentType::Other => "Other",
        }
    }

    /// Wire name, as it appears in report JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentType::TeenGang => "teen_gang",
            IncidentType::ChainSnatching => "chain_snatching",
            IncidentType::Harassment => "harassment",
            IncidentType::Other => "other",
        }
    }
}

impl std::fmt::Display for IncidentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity on the 1..=5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Severity(u8);

impl Severity {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Axis-aligned geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl GeoBounds {
    /// Bounds covering a single position.
    pub fn around(position: LatLng) -> Self {
        Self {
            south_west: position,
            north_east: position,
        }
    }

    /// Grow the bounds to include `position`.
    pub fn extend(&mut self, position: LatLng) {
        self.south_west.lat = self.south_west.lat.min(position.lat);
        self.south_west.lng = self.south_west.lng.min(position.lng);
        self.north_east.lat = self.north_east.lat.max(position.lat);
        self.north_east.lng = self.north_east.lng.max(position.lng);
    }

    /// Smallest bounds containing every position, or `None` for an empty iterator.
    pub fn from_positions(positions: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut positions = positions.into_iter();
        let mut bounds = Self::around(positions.next()?);
        for position in positions {
            bounds.extend(position);
        }
        Some(bounds)
    }

    pub fn contains(&self, position: LatLng) -> bool {
        position.lat >= self.south_west.lat
            && position.lat <= self.north_east.lat
            && position.lng >= self.south_west.lng
            && position.lng <= self.north_east.lng
    }
}

/// Raw incident record supplied by the filtering layer.
///
/// Coordinates follow the report-storage convention: `[longitude, latitude]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentReport {
    pub id: String,

    #[serde(default)]
    pub coordinates: Option<[f64; 2]>,

    pub severity: u8,

    #[serde(rename = "type")]
    pub incident_type: IncidentType,

    pub occurred_at: DateTime<Utc>,

    #[serde(default)]
    pub description: Option<String>,
}

impl IncidentReport {
    /// Create a report at `(lat, lng)`.
    pub fn new(
        id: impl Into<String>,
        lat: f64,
        lng: f64,
        severity: u8,
        incident_type: IncidentType,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            coordinates: Some([lng, lat]),
            severity,
            incident_type,
            occurred_at,
            description: None,
        }
    }

    /// Set the free-text description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Drop the coordinates (reports without a location do reach the engine).
    pub fn without_coordinates(mut self) -> Self {
        self.coordinates = None;
        self
    }

    /// Parse a JSON array of reports.
    pub fn parse_many(json: &str) -> Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A validated incident ready for weighting and clustering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncidentPoint {
    pub id: String,
    pub position: LatLng,
    pub severity: Severity,
    pub incident_type: IncidentType,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
}

impl IncidentPoint {
    /// Validate a raw report.
    ///
    /// Coordinates are checked first so that a report with both problems is
    /// classified as malformed input.
    pub fn from_report(report: &IncidentReport) -> Result<Self> {
        let position = validate_coordinates(&report.id, report.coordinates)?;
        let severity =
            Severity::new(report.severity).ok_or_else(|| ClusterError::SeverityOutOfRange {
                id: report.id.clone(),
                severity: report.severity,
            })?;

        Ok(Self {
            id: report.id.clone(),
            position,
            severity,
            incident_type: report.incident_type,
            occurred_at: report.occurred_at,
            description: report.description.clone(),
        })
    }

    /// Rebuild the report this point was validated from.
    pub fn to_report(&self) -> IncidentReport {
        IncidentReport {
            id: self.id.clone(),
            coordinates: Some([self.position.lng, self.position.lat]),
            severity: self.severity.value(),
            incident_type: self.incident_type,
            occurred_at: self.occurred_at,
            description: self.description.clone(),
        }
    }
}

fn validate_coordinates(id: &str, coordinates: Option<[f64; 2]>) -> Result<LatLng> {
    let [lng, lat] =
        coordinates.ok_or_else(|| ClusterError::invalid_coordinates(id, "missing"))?;

    if !lat.is_finite() || !lng.is_finite() {
        return Err(ClusterError::invalid_coordinates(id, "not finite"));
    }
    if lat == 0.0 || lng == 0.0 {
        return Err(ClusterError::invalid_coordinates(id, "zero component"));
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(ClusterError::invalid_coordinates(
            id,
            format!("out of range ({lat}, {lng})"),
        ));
    }

    Ok(LatLng::new(lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(coordinates: Option<[f64; 2]>, severity: u8) -> IncidentReport {
        IncidentReport {
            id: "r-1".into(),
            coordinates,
            severity,
            incident_type: IncidentType::Harassment,
            occurred_at: Utc::now(),
            description: None,
        }
    }

    #[test]
    fn test_coordinates_are_longitude_first() {
        let point = IncidentPoint::from_report(&report(Some([77.59, 12.97]), 3)).unwrap();
        assert_eq!(point.position, LatLng::new(12.97, 77.59));
    }

    #[test]
    fn test_missing_and_zero_coordinates_are_malformed() {
        for coords in [None, Some([0.0, 12.9]), Some([77.5, 0.0]), Some([f64::NAN, 1.0])] {
            let err = IncidentPoint::from_report(&report(coords, 3)).unwrap_err();
            assert!(err.is_malformed_input(), "{coords:?} should be malformed");
        }
    }

    #[test]
    fn test_out_of_range_coordinates_are_malformed() {
        let err = IncidentPoint::from_report(&report(Some([200.0, 12.0]), 3)).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_bad_severity_is_not_malformed_input() {
        let err = IncidentPoint::from_report(&report(Some([77.5, 12.9]), 7)).unwrap_err();
        assert!(matches!(err, ClusterError::SeverityOutOfRange { severity: 7, .. }));
    }

    #[test]
    fn test_point_converts_back_to_its_report() {
        let original = report(Some([77.59, 12.97]), 2);
        let point = IncidentPoint::from_report(&original).unwrap();
        assert_eq!(point.to_report(), original);
    }

    #[test]
    fn test_parse_reports_from_json() {
        let json = r#"[
            {"id": "a", "coordinates": [77.59, 12.97], "severity": 4,
             "type": "teen_gang", "occurred_at": "2026-10-01T10:00:00Z"},
            {"id": "b", "severity": 2, "type": "pickpocket",
             "occurred_at": "2026-10-02T10:00:00Z", "description": "near the market"}
        ]"#;
        let reports = IncidentReport::parse_many(json).unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].incident_type, IncidentType::TeenGang);
        assert_eq!(reports[1].incident_type, IncidentType::Other);
        assert!(reports[1].coordinates.is_none());
    }

    #[test]
    fn test_bounds_from_positions() {
        let bounds = GeoBounds::from_positions([
            LatLng::new(12.9, 77.5),
            LatLng::new(13.1, 77.4),
            LatLng::new(12.8, 77.7),
        ])
        .unwrap();
        assert_eq!(bounds.south_west, LatLng::new(12.8, 77.4));
        assert_eq!(bounds.north_east, LatLng::new(13.1, 77.7));
        assert!(bounds.contains(LatLng::new(13.0, 77.6)));
        assert!(GeoBounds::from_positions(Vec::new()).is_none());
    }
}
