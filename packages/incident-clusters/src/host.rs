//! The mapping host's viewport and layer-attachment API.
//!
//! These are the only calls the engine makes across the host boundary.

use serde::Serialize;

use crate::layer::{ClusterLayer, LayerId};
use crate::types::incident::GeoBounds;

/// Current viewport state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub zoom: f64,
    pub bounds: Option<GeoBounds>,
}

impl Viewport {
    pub fn at_zoom(zoom: f64) -> Self {
        Self { zoom, bounds: None }
    }
}

/// Mapping library surface used by the engine.
pub trait MapHost: Send {
    fn viewport(&self) -> Viewport;

    /// Attach a fully populated layer.
    fn add_layer(&mut self, layer: &ClusterLayer);

    /// Detach a previously attached layer.
    fn remove_layer(&mut self, layer: LayerId);

    /// Move the viewport so `bounds` is visible.
    fn fit_bounds(&mut self, bounds: GeoBounds);
}
