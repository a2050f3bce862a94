use incident_clusters::{ClusterLayer, GeoBounds, LayerId, MapHost, Viewport};
use tracing::info;

/// Map host with no rendering; logs attach and detach calls
pub struct HeadlessViewport {
    viewport: Viewport,
    attached: Option<LayerId>,
}

impl HeadlessViewport {
    pub fn new(zoom: f64) -> Self {
        Self {
            viewport: Viewport::at_zoom(zoom),
            attached: None,
        }
    }
}

impl MapHost for HeadlessViewport {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn add_layer(&mut self, layer: &ClusterLayer) {
        info!(
            layer = %layer.id(),
            markers = layer.marker_count(),
            clusters = layer.cluster_count(),
            "Layer attached"
        );
        self.attached = Some(layer.id());
    }

    fn remove_layer(&mut self, layer: LayerId) {
        info!(layer = %layer, "Layer detached");
        if self.attached == Some(layer) {
            self.attached = None;
        }
    }

    fn fit_bounds(&mut self, bounds: GeoBounds) {
        info!(
            south = bounds.south_west.lat,
            west = bounds.south_west.lng,
            north = bounds.north_east.lat,
            east = bounds.north_east.lng,
            "Fitting viewport to layer"
        );
        self.viewport.bounds = Some(bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use incident_clusters::ClusteringConfig;

    #[test]
    fn test_attaching_a_layer_leaves_viewport_zoom_alone() {
        let mut host = HeadlessViewport::new(12.0);
        let layer = ClusterLayer::new(ClusteringConfig::for_dataset(10), 15.0, None);

        host.add_layer(&layer);
        assert_eq!(host.viewport().zoom, 12.0);
        assert_eq!(host.attached, Some(layer.id()));

        host.remove_layer(layer.id());
        assert_eq!(host.attached, None);
    }
}
