//! Published octree handle
//!
//! Readers clone the handle and call [`OctreeHandle::load`] to get either a
//! complete snapshot or `None`. The manager withdraws the tree with
//! [`OctreeHandle::take`], mutates its private copy and stores it back, so a
//! reader never sees a half-patched tree.

use std::sync::Arc;

use parking_lot::RwLock;

use super::octree::Octree;

/// Shared, swappable reference to the current octree
#[derive(Debug, Clone, Default)]
pub struct OctreeHandle {
    slot: Arc<RwLock<Option<Arc<Octree>>>>,
}

impl OctreeHandle {
    /// Create an empty handle
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, `None` while unavailable
    ///
    /// Holding the snapshot forces the writer's next patch to clone the
    /// whole tree (copy on write), making that patch O(n). Keep snapshots
    /// short-lived.
    pub fn load(&self) -> Option<Arc<Octree>> {
        self.slot.read().clone()
    }

    /// True when a tree is published
    pub fn is_available(&self) -> bool {
        self.slot.read().is_some()
    }

    /// Publish a tree (or `None` to mark the index unavailable)
    pub fn store(&self, octree: Option<Arc<Octree>>) {
        *self.slot.write() = octree;
    }

    /// Withdraw the published tree, leaving the handle empty
    pub fn take(&self) -> Option<Arc<Octree>> {
        self.slot.write().take()
    }
}
