//! Minimal image and layer handles
//!
//! The pipeline never touches pixels; it only needs layer identity and
//! extents to snapshot resources and to build dirty-rect walkers. Layer
//! tree traversal and compositing live outside this crate.

use std::sync::Arc;

use crate::geometry::Rect;

/// Identifies one layer within an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

/// One paint layer, reduced to what dirty-region planning needs
#[derive(Debug, Clone, PartialEq)]
pub struct LayerNode {
    pub id: LayerId,
    pub name: String,
    /// On-image extent of the layer's device
    pub extent: Rect,
}

impl LayerNode {
    pub fn new(id: LayerId, name: impl Into<String>, extent: Rect) -> Self {
        Self {
            id,
            name: name.into(),
            extent,
        }
    }
}

/// A layered image, reduced to bounds and its layer stack
#[derive(Debug, Clone, Default)]
pub struct Image {
    bounds: Rect,
    layers: Vec<Arc<LayerNode>>,
    current_layer: Option<usize>,
}

impl Image {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            layers: Vec::new(),
            current_layer: None,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Append a layer and make it current
    pub fn add_layer(&mut self, layer: LayerNode) -> Arc<LayerNode> {
        let layer = Arc::new(layer);
        self.layers.push(layer.clone());
        self.current_layer = Some(self.layers.len() - 1);
        layer
    }

    pub fn layers(&self) -> &[Arc<LayerNode>] {
        &self.layers
    }

    pub fn current_layer(&self) -> Option<&Arc<LayerNode>> {
        self.current_layer.and_then(|i| self.layers.get(i))
    }

    pub fn set_current_layer(&mut self, id: LayerId) -> bool {
        match self.layers.iter().position(|l| l.id == id) {
            Some(index) => {
                self.current_layer = Some(index);
                true
            }
            None => false,
        }
    }
}
