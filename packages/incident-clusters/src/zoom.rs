//! Dataset-size tiers and their zoom-to-radius tables.
//!
//! Lower zoom (country view) groups aggressively with a large radius; higher
//! zoom (neighborhood view) uses a small one. The active band is a pure
//! function of `(dataset_size, zoom)`.

use serde::Serialize;

/// Dataset bucket selected once per pipeline run from the point count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetTier {
    Small,
    Medium,
    Large,
    VeryLarge,
}

impl DatasetTier {
    /// small < 50, medium < 200, large < 1000, very large otherwise.
    pub fn for_size(dataset_size: usize) -> Self {
        match dataset_size {
            0..=49 => DatasetTier::Small,
            50..=199 => DatasetTier::Medium,
            200..=999 => DatasetTier::Large,
            _ => DatasetTier::VeryLarge,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetTier::Small => "small",
            DatasetTier::Medium => "medium",
            DatasetTier::Large => "large",
            DatasetTier::VeryLarge => "very-large",
        }
    }
}

/// One row of a tier's zoom table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomBand {
    pub zoom_floor: f64,
    pub radius_px: f64,
    pub max_cluster_zoom: f64,
}

const fn band(zoom_floor: f64, radius_px: f64, max_cluster_zoom: f64) -> ZoomBand {
    ZoomBand {
        zoom_floor,
        radius_px,
        max_cluster_zoom,
    }
}

const SMALL_BANDS: &[ZoomBand] = &[
    band(0.0, 60.0, 14.0),
    band(6.0, 50.0, 14.0),
    band(10.0, 40.0, 14.0),
    band(13.0, 30.0, 14.0),
];

const MEDIUM_BANDS: &[ZoomBand] = &[
    band(0.0, 70.0, 15.0),
    band(6.0, 60.0, 15.0),
    band(10.0, 45.0, 15.0),
    band(13.0, 35.0, 15.0),
    band(15.0, 25.0, 15.0),
];

const LARGE_BANDS: &[ZoomBand] = &[
    band(0.0, 80.0, 16.0),
    band(5.0, 70.0, 16.0),
    band(8.0, 60.0, 16.0),
    band(11.0, 50.0, 16.0),
    band(14.0, 40.0, 16.0),
    band(16.0, 30.0, 16.0),
];

const VERY_LARGE_BANDS: &[ZoomBand] = &[
    band(0.0, 100.0, 17.0),
    band(5.0, 90.0, 17.0),
    band(8.0, 80.0, 17.0),
    band(11.0, 70.0, 17.0),
    band(14.0, 55.0, 17.0),
    band(16.0, 40.0, 17.0),
];

/// Immutable clustering configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusteringConfig {
    pub tier: DatasetTier,
    /// Ordered by ascending `zoom_floor`.
    pub zoom_bands: Vec<ZoomBand>,
    /// Disabled for very large datasets to protect the frame budget.
    pub animate: bool,
}

impl ClusteringConfig {
    pub fn for_tier(tier: DatasetTier) -> Self {
        let bands = match tier {
            DatasetTier::Small => SMALL_BANDS,
            DatasetTier::Medium => MEDIUM_BANDS,
            DatasetTier::Large => LARGE_BANDS,
            DatasetTier::VeryLarge => VERY_LARGE_BANDS,
        };
        Self {
            tier,
            zoom_bands: bands.to_vec(),
            animate: tier != DatasetTier::VeryLarge,
        }
    }

    pub fn for_dataset(dataset_size: usize) -> Self {
        Self::for_tier(DatasetTier::for_size(dataset_size))
    }

    /// Highest band whose floor is `<= zoom`; zooms below every floor use the first band.
    pub fn band_for(&self, zoom: f64) -> ZoomBand {
        self.zoom_bands
            .iter()
            .rev()
            .find(|b| b.zoom_floor <= zoom)
            .or_else(|| self.zoom_bands.first())
            .copied()
            .unwrap_or(band(0.0, 80.0, 16.0))
    }

    pub fn active_band(&self, zoom: f64) -> ActiveBand {
        let band = self.band_for(zoom);
        ActiveBand {
            tier: self.tier,
            zoom,
            radius_px: band.radius_px,
            max_cluster_zoom: band.max_cluster_zoom,
            animate: self.animate,
        }
    }
}

/// The radius and max-cluster-zoom in force at a specific zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActiveBand {
    pub tier: DatasetTier,
    pub zoom: f64,
    pub radius_px: f64,
    pub max_cluster_zoom: f64,
    pub animate: bool,
}

impl ActiveBand {
    /// Past `max_cluster_zoom` every marker is shown on its own.
    pub fn clustering_enabled(&self) -> bool {
        self.zoom <= self.max_cluster_zoom
    }
}

/// Resolves the active band from dataset size and zoom.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoomBandResolver;

impl ZoomBandResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn config_for(&self, dataset_size: usize) -> ClusteringConfig {
        ClusteringConfig::for_dataset(dataset_size)
    }

    pub fn resolve(&self, dataset_size: usize, zoom: f64) -> ActiveBand {
        self.config_for(dataset_size).active_band(zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(DatasetTier::for_size(0), DatasetTier::Small);
        assert_eq!(DatasetTier::for_size(49), DatasetTier::Small);
        assert_eq!(DatasetTier::for_size(50), DatasetTier::Medium);
        assert_eq!(DatasetTier::for_size(199), DatasetTier::Medium);
        assert_eq!(DatasetTier::for_size(200), DatasetTier::Large);
        assert_eq!(DatasetTier::for_size(999), DatasetTier::Large);
        assert_eq!(DatasetTier::for_size(1000), DatasetTier::VeryLarge);
    }

    #[test]
    fn test_very_large_dataset_disables_animation() {
        let config = ClusteringConfig::for_dataset(1200);
        assert_eq!(config.tier, DatasetTier::VeryLarge);
        assert_eq!(config.tier.as_str(), "very-large");
        assert!(!config.animate);
        assert!(ClusteringConfig::for_dataset(999).animate);
    }

    #[test]
    fn test_floor_tie_resolves_to_higher_band() {
        let config = ClusteringConfig::for_tier(DatasetTier::Large);
        assert_eq!(config.band_for(11.0).radius_px, 50.0);
        assert_eq!(config.band_for(10.99).radius_px, 60.0);
        assert_eq!(config.band_for(20.0).radius_px, 30.0);
    }

    #[test]
    fn test_zoom_below_every_floor_uses_first_band() {
        let config = ClusteringConfig::for_tier(DatasetTier::Small);
        assert_eq!(config.band_for(-1.0).radius_px, 60.0);
    }

    #[test]
    fn test_clustering_disabled_past_max_zoom() {
        let resolver = ZoomBandResolver::new();
        assert!(resolver.resolve(10, 14.0).clustering_enabled());
        assert!(!resolver.resolve(10, 14.5).clustering_enabled());
    }

    proptest! {
        #[test]
        fn resolve_is_pure(size in 0usize..5000, zoom in 0.0f64..20.0) {
            let resolver = ZoomBandResolver::new();
            prop_assert_eq!(resolver.resolve(size, zoom), resolver.resolve(size, zoom));
        }

        #[test]
        fn radius_never_grows_with_zoom(size in 0usize..5000, a in 0.0f64..20.0, b in 0.0f64..20.0) {
            let resolver = ZoomBandResolver::new();
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(resolver.resolve(size, high).radius_px <= resolver.resolve(size, low).radius_px);
        }
    }
}
