//! The update queue
//!
//! Pending walkers wait here in FIFO order until the updater context has
//! room for them. Dispatch greedily skips walkers that would overlap a
//! job already admitted in the same scan, and an explicit optimize pass
//! coalesces neighbouring dirty regions into one walker.
//!
//! The queue is appended to from the UI thread and drained from a
//! dispatcher thread; all queue state lives under one mutex. The critical
//! section never includes per-job computation, which runs in the updater
//! context's worker pool.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::update::context::UpdaterContext;
use crate::update::walker::RectsWalker;

#[derive(Debug, Default)]
struct QueueState {
    list: Vec<Arc<RectsWalker>>,
    blocked: bool,
}

/// FIFO queue of pending dirty-rect walkers
///
/// A walker, once added, is never lost: it either dispatches or is
/// coalesced into a walker covering its rectangle.
#[derive(Debug, Default)]
pub struct UpdateQueue {
    state: Mutex<QueueState>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Append a walker and dispatch whatever fits
    ///
    /// While the queue is blocked the walker is enqueued but nothing
    /// reaches the context.
    pub fn add_job(&self, walker: Arc<RectsWalker>, context: &mut UpdaterContext) {
        let mut state = self.lock();
        debug!(rect = ?walker.requested_rect(), "walker queued");
        state.list.push(walker);
        Self::process_locked(&mut state, context);
    }

    /// Dispatch pending walkers into the context
    ///
    /// Scans from the head in FIFO order; a walker that overlaps a job
    /// already in the context is skipped and keeps its position. Stops
    /// when the context is full or every walker has been considered.
    pub fn process_queue(&self, context: &mut UpdaterContext) {
        let mut state = self.lock();
        Self::process_locked(&mut state, context);
    }

    fn process_locked(state: &mut QueueState, context: &mut UpdaterContext) {
        if state.blocked {
            return;
        }

        let mut index = 0;
        while index < state.list.len() {
            if !context.has_spare_slot() {
                break;
            }
            if context.is_job_allowed(&state.list[index]) {
                let walker = state.list.remove(index);
                debug!(rect = ?walker.requested_rect(), "walker dispatched");
                context.add_job(walker);
            } else {
                index += 1;
            }
        }
    }

    /// Stop feeding the context; pending and new walkers stay queued
    pub fn block_processing(&self) {
        self.lock().blocked = true;
    }

    /// Resume dispatch and drain whatever fits right away
    pub fn start_processing(&self, context: &mut UpdaterContext) {
        {
            self.lock().blocked = false;
        }
        self.process_queue(context);
    }

    pub fn is_blocked(&self) -> bool {
        self.lock().blocked
    }

    /// Coalesce pending walkers with overlapping or adjacent rectangles
    ///
    /// Each cluster collapses into one walker covering the bounding union
    /// of its members, placed where the cluster head was; walkers that
    /// coalesce with nothing keep their order.
    pub fn optimize(&self) {
        let mut state = self.lock();
        let list = &mut state.list;

        let mut index = 0;
        while index < list.len() {
            let mut union = list[index].requested_rect();
            let mut merged_any = false;

            // Growing the union can make previously distant walkers
            // adjacent, so rescan until the cluster is stable
            loop {
                let mut changed = false;
                let mut candidate = index + 1;
                while candidate < list.len() {
                    let rect = list[candidate].requested_rect();
                    if rect.adjoins(&union) {
                        union = union.united(&rect);
                        list.remove(candidate);
                        merged_any = true;
                        changed = true;
                    } else {
                        candidate += 1;
                    }
                }
                if !changed {
                    break;
                }
            }

            if merged_any {
                debug!(rect = ?union, "walkers coalesced");
                list[index] = Arc::new(list[index].recollected(union));
            }
            index += 1;
        }
    }

    /// Snapshot of the pending walkers (testing only)
    pub fn walkers_list(&self) -> Vec<Arc<RectsWalker>> {
        self.lock().list.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().list.is_empty()
    }
}
