//! Dirty-rect walkers
//!
//! A walker is a precomputed plan of which layer rectangles must be
//! re-read to realize a dirty rectangle on the image. Planning happens
//! once, on the producer side; the queue and the updater context only
//! ever consult the precomputed rectangles.

use std::sync::Arc;

use crate::geometry::Rect;
use crate::image::{LayerId, LayerNode};

/// A dirty-region walk plan, immutable once collected
///
/// Shared by reference between the producer, the update queue and the
/// updater context.
#[derive(Debug, Clone)]
pub struct RectsWalker {
    image_rect: Rect,
    requested_rect: Rect,
    layer: Option<Arc<LayerNode>>,
    access_rects: Vec<(LayerId, Rect)>,
}

impl RectsWalker {
    pub fn new(image_rect: Rect) -> Self {
        Self {
            image_rect,
            requested_rect: Rect::empty(),
            layer: None,
            access_rects: Vec::new(),
        }
    }

    /// Plan the walk for a dirty rectangle on the given layer
    pub fn collect_rects(&mut self, layer: &Arc<LayerNode>, dirty_rect: Rect) {
        self.requested_rect = dirty_rect;
        self.layer = Some(Arc::clone(layer));

        self.access_rects.clear();
        let layer_rect = dirty_rect.intersected(&layer.extent);
        if !layer_rect.is_empty() {
            self.access_rects.push((layer.id, layer_rect));
        }
        // The projection is re-composited wherever the dirty rect touches
        // the image
        let projection_rect = dirty_rect.intersected(&self.image_rect);
        if !projection_rect.is_empty() {
            self.access_rects.push((layer.id, projection_rect));
        }
    }

    /// The on-image rectangle this walker is responsible for
    pub fn requested_rect(&self) -> Rect {
        self.requested_rect
    }

    pub fn image_rect(&self) -> Rect {
        self.image_rect
    }

    pub fn layer(&self) -> Option<&Arc<LayerNode>> {
        self.layer.as_ref()
    }

    /// Per-layer rectangles that will be read during the walk
    pub fn access_rects(&self) -> &[(LayerId, Rect)] {
        &self.access_rects
    }

    /// Conservative overlap test against another walker
    ///
    /// May report overlap for rectangles that do not actually collide,
    /// but never misses a real collision on any access rectangle.
    pub fn checks_overlap(&self, other: &RectsWalker) -> bool {
        if self.requested_rect.intersects(&other.requested_rect) {
            return true;
        }
        self.access_rects.iter().any(|(_, mine)| {
            other
                .access_rects
                .iter()
                .any(|(_, theirs)| mine.intersects(theirs))
        })
    }

    /// A fresh walker over the same layer covering `rect` instead
    ///
    /// Used by queue coalescing to replace a cluster of walkers with one
    /// that spans their bounding union.
    pub fn recollected(&self, rect: Rect) -> RectsWalker {
        let mut walker = RectsWalker::new(self.image_rect);
        match &self.layer {
            Some(layer) => walker.collect_rects(layer, rect),
            None => walker.requested_rect = rect,
        }
        walker
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_layer() -> Arc<LayerNode> {
        Arc::new(LayerNode::new(
            LayerId(1),
            "paint",
            Rect::from_xywh(0, 0, 200, 200),
        ))
    }

    fn make_walker(dirty: Rect) -> RectsWalker {
        let mut walker = RectsWalker::new(Rect::from_xywh(0, 0, 200, 200));
        walker.collect_rects(&test_layer(), dirty);
        walker
    }

    #[test]
    fn test_collect_rects_clips_to_layer_and_image() {
        let layer = Arc::new(LayerNode::new(
            LayerId(3),
            "small",
            Rect::from_xywh(0, 0, 50, 50),
        ));
        let mut walker = RectsWalker::new(Rect::from_xywh(0, 0, 200, 200));
        walker.collect_rects(&layer, Rect::from_xywh(25, 25, 100, 100));

        assert_eq!(walker.requested_rect(), Rect::from_xywh(25, 25, 100, 100));
        assert_eq!(
            walker.access_rects()[0],
            (LayerId(3), Rect::from_xywh(25, 25, 25, 25))
        );
        assert_eq!(
            walker.access_rects()[1],
            (LayerId(3), Rect::from_xywh(25, 25, 100, 100))
        );
    }

    #[test]
    fn test_overlap_is_open_on_shared_edges() {
        // Touching rectangles must not count as overlapping, or adjacent
        // updates could never run concurrently
        let a = make_walker(Rect::from_xywh(0, 0, 50, 100));
        let b = make_walker(Rect::from_xywh(50, 0, 50, 100));
        assert!(!a.checks_overlap(&b));

        let c = make_walker(Rect::from_xywh(0, 0, 100, 100));
        assert!(a.checks_overlap(&c));
        assert!(c.checks_overlap(&a));
    }

    #[test]
    fn test_recollected_covers_new_rect() {
        let walker = make_walker(Rect::from_xywh(0, 0, 50, 100));
        let rebuilt = walker.recollected(Rect::from_xywh(0, 0, 100, 100));

        assert_eq!(rebuilt.requested_rect(), Rect::from_xywh(0, 0, 100, 100));
        assert!(rebuilt.layer().is_some());
        assert!(!rebuilt.access_rects().is_empty());
    }
}
