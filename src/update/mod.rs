//! Dirty-region update scheduling
//!
//! Paint activity marks layers dirty; each dirty rectangle becomes a
//! precomputed walker, queued here and dispatched to a fixed pool of
//! non-overlapping job slots.

pub mod context;
pub mod queue;
pub mod walker;

pub use context::UpdaterContext;
pub use queue::UpdateQueue;
pub use walker::RectsWalker;
