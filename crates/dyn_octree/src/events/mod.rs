//! Member notifications and the manager's subscription table
//!
//! Key principles:
//! - Registration system (only subscribed members are acted on)
//! - Explicit detach on every exit path, never implicit
//! - Queuing support so notifications raised from several places are applied
//!   one at a time

use bitflags::bitflags;
use parking_lot::Mutex;
use slotmap::SecondaryMap;

use crate::spatial::{BoundingBox, MemberId};

/// Notification a member raises about its bound
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundEvent {
    /// The bound changed from `old` to `new`
    Changed {
        /// Bound before the change (what the tree indexed)
        old: BoundingBox,
        /// Bound after the change
        new: BoundingBox,
    },
    /// The bound became available for the first time
    Initialized,
}

impl BoundEvent {
    /// Subscription a handler needs to receive this event
    pub fn subscription(&self) -> Subscription {
        match self {
            BoundEvent::Changed { .. } => Subscription::BOUND_CHANGED,
            BoundEvent::Initialized => Subscription::BOUND_INITIALIZED,
        }
    }
}

bitflags! {
    /// Notifications the manager listens to for one member
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Subscription: u8 {
        /// Relocate the member whenever its bound changes
        const BOUND_CHANGED = 1 << 0;
        /// One-shot: insert the member once its bound is known
        const BOUND_INITIALIZED = 1 << 1;
    }
}

/// Per-member registration table owned by the manager
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    entries: SecondaryMap<MemberId, Subscription>,
}

impl SubscriptionTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `flags` to the member's subscriptions. Subscribing twice is a no-op.
    pub fn subscribe(&mut self, id: MemberId, flags: Subscription) {
        match self.entries.get_mut(id) {
            Some(existing) => existing.insert(flags),
            None => {
                self.entries.insert(id, flags);
            }
        }
    }

    /// Remove `flags`; returns whether any of them were set
    pub fn unsubscribe(&mut self, id: MemberId, flags: Subscription) -> bool {
        let Some(existing) = self.entries.get_mut(id) else {
            return false;
        };
        let was_set = existing.intersects(flags);
        existing.remove(flags);
        if existing.is_empty() {
            self.entries.remove(id);
        }
        was_set
    }

    /// Drop every subscription of one member
    pub fn cancel(&mut self, id: MemberId) -> Subscription {
        self.entries.remove(id).unwrap_or_default()
    }

    /// Check whether all of `flags` are set for the member
    pub fn is_subscribed(&self, id: MemberId, flags: Subscription) -> bool {
        self.entries.get(id).is_some_and(|existing| existing.contains(flags))
    }

    /// Current flags of a member
    pub fn get(&self, id: MemberId) -> Subscription {
        self.entries.get(id).copied().unwrap_or_default()
    }

    /// Remove `flags` from every member
    pub fn unsubscribe_all(&mut self, flags: Subscription) {
        self.entries.retain(|_, existing| {
            existing.remove(flags);
            !existing.is_empty()
        });
    }

    /// Drop the whole table
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Members with at least one subscription
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nobody is subscribed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Members holding all of `flags`
    pub fn members_with(&self, flags: Subscription) -> Vec<MemberId> {
        self.entries
            .iter()
            .filter(|(_, existing)| existing.contains(flags))
            .map(|(id, _)| id)
            .collect()
    }
}

/// Notification queue that serializes tree mutations
///
/// Producers on any thread [`send`](Self::send); the owner of the manager
/// drains the queue and applies events in arrival order.
#[derive(Debug, Default)]
pub struct NotificationQueue {
    pending: Mutex<Vec<(MemberId, BoundEvent)>>,
}

impl NotificationQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notification for later delivery
    pub fn send(&self, id: MemberId, event: BoundEvent) {
        self.pending.lock().push((id, event));
    }

    /// Take everything queued so far
    pub fn drain(&self) -> Vec<(MemberId, BoundEvent)> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Number of queued notifications
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    /// Clear all queued events (useful when the tree is rebuilt anyway)
    pub fn clear(&self) {
        self.pending.lock().clear();
    }
}
