//! Updater context: the slot pool jobs are dispatched into
//!
//! The context holds a fixed number of job slots. Admission guarantees
//! that the walkers bound to occupied slots never overlap, so slot jobs
//! can execute concurrently on the worker pool without further locking.

use std::sync::Arc;

use tracing::debug;

use crate::update::walker::RectsWalker;

/// Fixed-capacity slot pool for walker jobs
#[derive(Debug)]
pub struct UpdaterContext {
    slots: Vec<Option<Arc<RectsWalker>>>,
}

impl UpdaterContext {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn has_spare_slot(&self) -> bool {
        self.slots.iter().any(|slot| slot.is_none())
    }

    /// Whether the walker may run next to every job already admitted
    pub fn is_job_allowed(&self, walker: &RectsWalker) -> bool {
        self.slots
            .iter()
            .flatten()
            .all(|running| !running.checks_overlap(walker))
    }

    /// Claim a free slot for the walker; `false` when the pool is full
    ///
    /// Callers check `is_job_allowed` first; admission itself only needs
    /// a spare slot.
    pub fn add_job(&mut self, walker: Arc<RectsWalker>) -> bool {
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                debug!(rect = ?walker.requested_rect(), "job admitted");
                *slot = Some(walker);
                true
            }
            None => false,
        }
    }

    /// The current slot contents, in slot order
    pub fn jobs(&self) -> &[Option<Arc<RectsWalker>>] {
        &self.slots
    }

    /// Walkers currently bound to slots, skipping empty ones
    pub fn running_walkers(&self) -> Vec<Arc<RectsWalker>> {
        self.slots.iter().flatten().cloned().collect()
    }

    /// Release one slot, returning its walker
    pub fn finish_job(&mut self, slot: usize) -> Option<Arc<RectsWalker>> {
        self.slots.get_mut(slot).and_then(|slot| slot.take())
    }

    /// Force all slots empty (testing only)
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;
    use crate::image::{LayerId, LayerNode};

    fn walker(dirty: Rect) -> Arc<RectsWalker> {
        let layer = Arc::new(LayerNode::new(
            LayerId(1),
            "paint",
            Rect::from_xywh(0, 0, 200, 200),
        ));
        let mut walker = RectsWalker::new(Rect::from_xywh(0, 0, 200, 200));
        walker.collect_rects(&layer, dirty);
        Arc::new(walker)
    }

    #[test]
    fn test_slots_fill_and_clear() {
        let mut context = UpdaterContext::new(2);
        assert!(context.has_spare_slot());

        assert!(context.add_job(walker(Rect::from_xywh(0, 0, 10, 10))));
        assert!(context.add_job(walker(Rect::from_xywh(100, 100, 10, 10))));
        assert!(!context.has_spare_slot());
        assert!(!context.add_job(walker(Rect::from_xywh(50, 50, 10, 10))));

        context.clear();
        assert!(context.has_spare_slot());
        assert!(context.running_walkers().is_empty());
    }

    #[test]
    fn test_admission_refuses_overlap() {
        let mut context = UpdaterContext::new(4);
        context.add_job(walker(Rect::from_xywh(0, 0, 100, 100)));

        assert!(!context.is_job_allowed(&walker(Rect::from_xywh(50, 50, 100, 100))));
        assert!(context.is_job_allowed(&walker(Rect::from_xywh(100, 0, 50, 50))));
    }

    #[test]
    fn test_finish_job_frees_slot() {
        let mut context = UpdaterContext::new(1);
        let w = walker(Rect::from_xywh(0, 0, 10, 10));
        context.add_job(Arc::clone(&w));

        let finished = context.finish_job(0).unwrap();
        assert_eq!(finished.requested_rect(), w.requested_rect());
        assert!(context.has_spare_slot());
        assert!(context.finish_job(0).is_none());
    }
}
