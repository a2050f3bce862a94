use anyhow::{Context, Result};
use dotenvy::dotenv;
use incident_clusters::PipelineSettings;
use std::env;

/// Command-line values that take precedence over the environment
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub batch_size: Option<usize>,
    pub yield_delay_ms: Option<u64>,
    pub recluster_threshold: Option<f64>,
}

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub batch_size: usize,
    pub yield_delay_ms: u64,
    pub recluster_threshold: f64,
    pub log_filter: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();
        let defaults = PipelineSettings::default();

        Ok(Self {
            batch_size: env::var("CLUSTER_BATCH_SIZE")
                .unwrap_or_else(|_| defaults.batch_size.to_string())
                .parse()
                .context("CLUSTER_BATCH_SIZE must be a valid number")?,
            yield_delay_ms: env::var("CLUSTER_YIELD_DELAY_MS")
                .unwrap_or_else(|_| defaults.yield_delay_ms.to_string())
                .parse()
                .context("CLUSTER_YIELD_DELAY_MS must be a valid number")?,
            recluster_threshold: env::var("CLUSTER_RECLUSTER_THRESHOLD")
                .unwrap_or_else(|_| defaults.recluster_threshold.to_string())
                .parse()
                .context("CLUSTER_RECLUSTER_THRESHOLD must be a valid number")?,
            log_filter: env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,incident_clusters=debug".to_string()),
        })
    }

    /// Pipeline settings with optional command-line overrides applied
    pub fn pipeline_settings(&self, overrides: Overrides) -> Result<PipelineSettings> {
        let settings = PipelineSettings {
            batch_size: overrides.batch_size.unwrap_or(self.batch_size),
            yield_delay_ms: overrides.yield_delay_ms.unwrap_or(self.yield_delay_ms),
            recluster_threshold: overrides
                .recluster_threshold
                .unwrap_or(self.recluster_threshold),
        };
        settings
            .validate()
            .context("Invalid pipeline settings")?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            batch_size: 100,
            yield_delay_ms: 10,
            recluster_threshold: 2.0,
            log_filter: "info".to_string(),
        }
    }

    #[test]
    fn test_overrides_take_precedence() {
        let settings = config()
            .pipeline_settings(Overrides {
                batch_size: Some(25),
                yield_delay_ms: None,
                recluster_threshold: Some(3.0),
            })
            .unwrap();

        assert_eq!(settings.batch_size, 25);
        assert_eq!(settings.yield_delay_ms, 10);
        assert_eq!(settings.recluster_threshold, 3.0);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let result = config().pipeline_settings(Overrides {
            batch_size: Some(0),
            ..Overrides::default()
        });
        assert!(result.is_err());
    }
}
