//! Configuration types for ingestion and reconciliation.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ClusterError, Result};

/// Settings for the chunked ingestion pipeline and zoom reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Points added to the cluster structure per batch.
    ///
    /// Default: 100.
    pub batch_size: usize,

    /// Pause between batches, in milliseconds.
    ///
    /// Zero still yields to the runtime once per batch. Default: 10.
    pub yield_delay_ms: u64,

    /// Minimum zoom distance from the clustered zoom that triggers a recluster.
    ///
    /// Default: 2.0.
    pub recluster_threshold: f64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            yield_delay_ms: 10,
            recluster_threshold: 2.0,
        }
    }
}

impl PipelineSettings {
    /// Create settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the inter-batch pause.
    pub fn with_yield_delay(mut self, delay: Duration) -> Self {
        self.yield_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set the recluster threshold.
    pub fn with_recluster_threshold(mut self, threshold: f64) -> Self {
        self.recluster_threshold = threshold;
        self
    }

    pub fn yield_delay(&self) -> Duration {
        Duration::from_millis(self.yield_delay_ms)
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(ClusterError::InvalidSettings {
                reason: "batch_size must be at least 1".into(),
            });
        }
        if !self.recluster_threshold.is_finite() || self.recluster_threshold <= 0.0 {
            return Err(ClusterError::InvalidSettings {
                reason: format!(
                    "recluster_threshold must be positive, got {}",
                    self.recluster_threshold
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.batch_size, 100);
        assert_eq!(settings.yield_delay(), Duration::from_millis(10));
        assert_eq!(settings.recluster_threshold, 2.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let settings = PipelineSettings::new().with_batch_size(0);
        assert!(matches!(
            settings.validate(),
            Err(ClusterError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_threshold() {
        assert!(PipelineSettings::new()
            .with_recluster_threshold(0.0)
            .validate()
            .is_err());
        assert!(PipelineSettings::new()
            .with_recluster_threshold(f64::NAN)
            .validate()
            .is_err());
    }

    #[test]
    fn test_deserialize_partial_json_is_rejected() {
        // Every field is required; the CLI fills gaps from the environment.
        assert!(serde_json::from_str::<PipelineSettings>(r#"{"batch_size": 5}"#).is_err());
    }
}
