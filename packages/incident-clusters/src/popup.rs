//! Per-marker popup payload.

use serde::Serialize;

use crate::types::incident::{IncidentPoint, Severity};

/// Descriptions longer than this many characters are truncated.
pub const DESCRIPTION_LIMIT: usize = 120;

const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityBadge {
    pub label: String,
    pub color_hex: &'static str,
}

/// Structured content the host templates into a popup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupContent {
    pub title: String,
    pub severity_badge: SeverityBadge,
    pub description: Option<String>,
    pub occurred_at: String,
    pub short_id: String,
}

/// Build the popup for one point.
pub fn build_popup(point: &IncidentPoint) -> PopupContent {
    PopupContent {
        title: point.incident_type.label().to_string(),
        severity_badge: severity_badge(point.severity),
        description: point
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(truncate),
        occurred_at: point.occurred_at.format("%b %d, %Y %H:%M").to_string(),
        short_id: point.id.chars().take(SHORT_ID_LEN).collect(),
    }
}

fn severity_badge(severity: Severity) -> SeverityBadge {
    let (name, color_hex) = match severity.value() {
        5 => ("Critical", "#b91c1c"),
        4 => ("High", "#ea580c"),
        3 => ("Moderate", "#ca8a04"),
        2 => ("Low", "#65a30d"),
        _ => ("Minimal", "#16a34a"),
    };
    SeverityBadge {
        label: format!("{} ({}/5)", name, severity.value()),
        color_hex,
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text.to_string();
    }
    let mut out: String = text.chars().take(DESCRIPTION_LIMIT).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::incident::{IncidentReport, IncidentType};
    use chrono::{TimeZone, Utc};

    fn point(description: Option<&str>) -> IncidentPoint {
        let occurred_at = Utc.with_ymd_and_hms(2026, 3, 7, 21, 5, 0).unwrap();
        let mut report = IncidentReport::new(
            "6f1c2a9e-aaaa-bbbb",
            12.97,
            77.59,
            4,
            IncidentType::ChainSnatching,
            occurred_at,
        );
        report.description = description.map(String::from);
        IncidentPoint::from_report(&report).unwrap()
    }

    #[test]
    fn test_popup_fields() {
        let popup = build_popup(&point(Some("Two riders, black scooter")));
        assert_eq!(popup.title, "Chain Snatching");
        assert_eq!(popup.severity_badge.label, "High (4/5)");
        assert_eq!(popup.severity_badge.color_hex, "#ea580c");
        assert_eq!(popup.description.as_deref(), Some("Two riders, black scooter"));
        assert_eq!(popup.occurred_at, "Mar 07, 2026 21:05");
        assert_eq!(popup.short_id, "6f1c2a9e");
    }

    #[test]
    fn test_long_description_truncated() {
        let long = "word ".repeat(60);
        let popup = build_popup(&point(Some(&long)));
        let description = popup.description.unwrap();
        assert!(description.ends_with('…'));
        assert!(description.chars().count() <= DESCRIPTION_LIMIT + 1);
    }

    #[test]
    fn test_blank_description_omitted() {
        assert_eq!(build_popup(&point(Some("   "))).description, None);
        assert_eq!(build_popup(&point(None)).description, None);
    }
}
