//! Typed errors for the clustering engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell
//! malformed input apart from processing failures.

use thiserror::Error;

/// Errors that can occur while turning reports into a cluster layer.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Report has missing, zero, non-finite or out-of-range coordinates
    #[error("invalid coordinates for report {id}: {reason}")]
    InvalidCoordinates { id: String, reason: String },

    /// Severity outside the 1..=5 scale
    #[error("severity {severity} out of range for report {id} (expected 1..=5)")]
    SeverityOutOfRange { id: String, severity: u8 },

    /// Icon requested for a cluster with no members
    #[error("cannot encode an icon for an empty cluster")]
    EmptyCluster,

    /// Pipeline or engine settings are unusable
    #[error("invalid settings: {reason}")]
    InvalidSettings { reason: String },

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClusterError {
    /// Malformed input is dropped silently; everything else aborts the current batch.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, ClusterError::InvalidCoordinates { .. })
    }

    pub(crate) fn invalid_coordinates(id: &str, reason: impl Into<String>) -> Self {
        ClusterError::InvalidCoordinates {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for clustering operations.
pub type Result<T> = std::result::Result<T, ClusterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_coordinates_are_malformed_input() {
        assert!(ClusterError::invalid_coordinates("r-1", "missing").is_malformed_input());
        assert!(!ClusterError::SeverityOutOfRange {
            id: "r-1".into(),
            severity: 9
        }
        .is_malformed_input());
        assert!(!ClusterError::EmptyCluster.is_malformed_input());
    }

    #[test]
    fn test_error_messages_name_the_report() {
        let err = ClusterError::SeverityOutOfRange {
            id: "abc".into(),
            severity: 0,
        };
        assert_eq!(
            err.to_string(),
            "severity 0 out of range for report abc (expected 1..=5)"
        );
    }
}
