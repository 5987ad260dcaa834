//! Octree manager
//!
//! Keeps one octree in step with a changing member collection. It decides
//! between a local patch and a full rebuild, reacts to per-member bound
//! notifications and publishes the current tree through an [`OctreeHandle`].
//!
//! Every mutation follows the same pattern: take the tree out of the handle
//! (readers now see "unavailable"), patch the private copy, store it back.
//! When a patch cannot be made the tree stays withdrawn and
//! [`OctreeManager::request_update_octree`] is raised; the host owes a
//! [`OctreeManager::rebuild_tree`].
//!
//! Each manager indexes exactly one element collection. Do not share a
//! manager between two collections.

use std::sync::Arc;

use super::bounds::BoundingBox;
use super::error::OctreeError;
use super::handle::OctreeHandle;
use super::member::{GeometryMember, MemberId, SceneElement};
use super::node::OctreeItem;
use super::octree::Octree;
use super::parameters::OctreeBuildParameter;
use crate::events::{BoundEvent, NotificationQueue, Subscription, SubscriptionTable};

/// Lifecycle state of the managed tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagerState {
    /// No tree and nothing owed
    Empty,
    /// Tree published and valid for readers
    Live,
    /// No tree; a full rebuild is owed
    RebuildPending,
    /// Tree withdrawn while one member is patched
    Mutating,
}

/// What a notification did to the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundChangeOutcome {
    /// Stale or unsubscribed notification; nothing changed
    Ignored,
    /// New bound still fits the holding node and was swapped in there
    InPlace,
    /// Member was re-inserted through the root
    Relocated,
    /// A pending member was inserted for the first time
    Inserted,
    /// The member no longer fits the root; a rebuild is owed
    RebuildRequested,
}

/// Builds and maintains the octree for one element collection
#[derive(Debug)]
pub struct OctreeManager {
    /// Published tree
    handle: OctreeHandle,

    /// Parameters for the next build
    parameter: OctreeBuildParameter,

    /// Which members we currently listen to
    subscriptions: SubscriptionTable,

    enabled: bool,
    request_update_octree: bool,
    state: ManagerState,
}

impl Default for OctreeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl OctreeManager {
    /// Create an enabled manager with default parameters
    pub fn new() -> Self {
        Self::with_parameter(OctreeBuildParameter::default())
    }

    /// Create an enabled manager with the given parameters
    pub fn with_parameter(parameter: OctreeBuildParameter) -> Self {
        Self {
            handle: OctreeHandle::new(),
            parameter,
            subscriptions: SubscriptionTable::new(),
            enabled: true,
            request_update_octree: false,
            state: ManagerState::Empty,
        }
    }

    /// Create a manager with parameters loaded from a `.toml` or `.ron` file
    pub fn from_config_file(path: &str) -> Result<Self, OctreeError> {
        let parameter = OctreeBuildParameter::load_validated(path)?;
        Ok(Self::with_parameter(parameter))
    }

    /// Current tree, `None` when no spatial index is available
    ///
    /// The snapshot is shared with the manager. While it is held, the next
    /// patch copies the whole tree before mutating it, so drop snapshots
    /// before applying notifications instead of keeping them across ticks.
    pub fn octree(&self) -> Option<Arc<Octree>> {
        self.handle.load()
    }

    /// Handle for readers that outlive a borrow of the manager
    pub fn handle(&self) -> OctreeHandle {
        self.handle.clone()
    }

    /// Lifecycle state
    pub fn state(&self) -> ManagerState {
        self.state
    }

    /// True when a full rebuild is owed
    pub fn request_update_octree(&self) -> bool {
        self.request_update_octree
    }

    /// Whether the manager is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Parameters used by the next build
    pub fn parameter(&self) -> &OctreeBuildParameter {
        &self.parameter
    }

    /// Subscription table (read-only)
    pub fn subscriptions(&self) -> &SubscriptionTable {
        &self.subscriptions
    }

    /// Replace all parameters. Applies from the next rebuild.
    pub fn set_parameter(&mut self, parameter: OctreeBuildParameter) -> Result<(), OctreeError> {
        parameter.validate()?;
        self.parameter = parameter;
        Ok(())
    }

    /// Minimum octant size for the next rebuild
    pub fn set_min_octant_size(&mut self, min_octant_size: f32) -> Result<(), OctreeError> {
        self.set_parameter(OctreeBuildParameter { min_octant_size, ..self.parameter })
    }

    /// Prune empty subtrees from the next rebuild on
    pub fn set_auto_delete_if_empty(&mut self, auto_delete_if_empty: bool) {
        self.parameter.auto_delete_if_empty = auto_delete_if_empty;
    }

    /// Cube octants from the next rebuild on
    pub fn set_cubify(&mut self, cubify: bool) {
        self.parameter.cubify = cubify;
    }

    /// Record hit paths from the next rebuild on
    pub fn set_record_hit_path_bounding_boxes(&mut self, record: bool) {
        self.parameter.record_hit_path_bounding_boxes = record;
    }

    /// Enable or disable the manager
    ///
    /// Disabling drops the tree and every subscription. Enabling again only
    /// marks a rebuild as owed; it never builds by itself.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            self.request_rebuild();
        } else {
            self.clear();
        }
    }

    /// Withdraw the tree from readers for patching
    fn withdraw(&mut self) -> Option<Arc<Octree>> {
        let tree = self.handle.take();
        if tree.is_some() {
            self.state = ManagerState::Mutating;
        }
        tree
    }

    /// Make a tree visible to readers again
    fn publish(&mut self, tree: Arc<Octree>) {
        self.handle.store(Some(tree));
        self.state = ManagerState::Live;
    }

    /// Discard the current tree and build a fresh one from `elements`
    ///
    /// Elements that are not geometry are ignored. Members whose bound is not
    /// measured yet are left out and picked up by a one-shot
    /// [`Subscription::BOUND_INITIALIZED`].
    pub fn rebuild_tree<E: SceneElement>(&mut self, elements: &[E]) -> Result<(), OctreeError> {
        self.request_update_octree = false;
        if !self.enabled {
            self.clear();
            return Err(OctreeError::Disabled);
        }

        self.clear();
        self.subscriptions.unsubscribe_all(Subscription::BOUND_CHANGED);

        let members: Vec<&dyn GeometryMember> =
            elements.iter().filter_map(SceneElement::as_geometry).collect();
        let tree = Octree::build(
            members.iter().map(|member| OctreeItem::new(member.id(), member.bounds())),
            self.parameter,
        );

        if !tree.tree_built() {
            log::warn!("Octree rebuild over {} members produced no tree", members.len());
            self.request_rebuild();
            return Err(OctreeError::EmptyBuild);
        }

        for member in &members {
            let bound = member.bounds();
            if bound.is_valid() {
                self.subscriptions.unsubscribe(member.id(), Subscription::BOUND_INITIALIZED);
                self.subscriptions.subscribe(member.id(), Subscription::BOUND_CHANGED);
            } else if bound.is_empty() {
                self.subscriptions.subscribe(member.id(), Subscription::BOUND_INITIALIZED);
            }
        }

        log::info!(
            "Octree rebuilt: {} of {} members, {} nodes, depth {}",
            tree.item_count(),
            members.len(),
            tree.node_count(),
            tree.depth()
        );
        self.publish(Arc::new(tree));
        Ok(())
    }

    /// React to a member's bound changing from `old` to `new`
    ///
    /// When the new bound still fits the node that holds the member, the new
    /// entry is added there first and the stale one removed only once that
    /// worked. Otherwise the stale entry is dropped straight away and the
    /// member goes back in through the root; losing the tree to a rebuild is
    /// preferred over losing the member.
    pub fn on_bound_changed(
        &mut self,
        member: &dyn GeometryMember,
        old: &BoundingBox,
        new: &BoundingBox,
    ) -> BoundChangeOutcome {
        let id = member.id();
        if !self.handle.is_available()
            || !member.is_attached()
            || !self.subscriptions.is_subscribed(id, Subscription::BOUND_CHANGED)
        {
            self.subscriptions.unsubscribe(id, Subscription::BOUND_CHANGED);
            return BoundChangeOutcome::Ignored;
        }

        let Some(mut tree) = self.withdraw() else {
            return BoundChangeOutcome::Ignored;
        };
        let octree = Arc::make_mut(&mut tree);
        let item = OctreeItem::new(id, *new);

        match octree.find_child_by_item_bound(id, old) {
            Some(location) => {
                let fits = new.is_valid()
                    && octree
                        .node(&location)
                        .is_some_and(|node| node.bound().contains_box(new));
                if fits && octree.add_at(&location, item) {
                    log::debug!("Member {:?}: new bound inside current node", id);
                    octree.remove_at(&location);
                    self.publish(tree);
                    return BoundChangeOutcome::InPlace;
                }
                log::debug!("Member {:?}: new bound outside current node", id);
                octree.remove_at(&location);
            }
            None => {
                log::debug!("Member {:?}: not found by its old bound {:?}", id, old);
            }
        }

        if octree.add(item) {
            self.publish(tree);
            BoundChangeOutcome::Relocated
        } else {
            log::debug!("{}, rebuild owed", OctreeError::OutsideRoot { id });
            self.request_rebuild();
            BoundChangeOutcome::RebuildRequested
        }
    }

    /// React to a pending member's bound becoming available
    pub fn on_bound_initialized(&mut self, member: &dyn GeometryMember) -> BoundChangeOutcome {
        if !self.subscriptions.unsubscribe(member.id(), Subscription::BOUND_INITIALIZED) {
            return BoundChangeOutcome::Ignored;
        }
        if self.add_item(member) {
            BoundChangeOutcome::Inserted
        } else {
            BoundChangeOutcome::RebuildRequested
        }
    }

    /// Deliver one notification
    pub fn notify(&mut self, member: &dyn GeometryMember, event: BoundEvent) -> BoundChangeOutcome {
        match event {
            BoundEvent::Changed { old, new } => self.on_bound_changed(member, &old, &new),
            BoundEvent::Initialized => self.on_bound_initialized(member),
        }
    }

    /// Apply every queued notification in arrival order
    ///
    /// `lookup` resolves ids to live members; notifications for members it
    /// cannot resolve are dropped along with their subscriptions. Returns the
    /// number of notifications that changed the tree.
    pub fn process_queue<'a, F>(&mut self, queue: &NotificationQueue, mut lookup: F) -> usize
    where
        F: FnMut(MemberId) -> Option<&'a dyn GeometryMember>,
    {
        let mut applied = 0;
        for (id, event) in queue.drain() {
            let Some(member) = lookup(id) else {
                self.subscriptions.cancel(id);
                continue;
            };
            if self.notify(member, event) != BoundChangeOutcome::Ignored {
                applied += 1;
            }
        }
        applied
    }

    /// Track an element that may not have a bound yet
    ///
    /// Returns false when the manager is disabled or the element is not
    /// geometry. A measured member is inserted right away; an unmeasured one
    /// waits for [`OctreeManager::on_bound_initialized`].
    pub fn add_pending_item<E: SceneElement + ?Sized>(&mut self, element: &E) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(member) = element.as_geometry() else {
            return false;
        };

        if member.bounds().is_valid() {
            self.add_item(member);
        } else {
            self.subscriptions.subscribe(member.id(), Subscription::BOUND_INITIALIZED);
        }
        true
    }

    /// Insert through the root, requesting a rebuild when that fails
    fn add_item(&mut self, member: &dyn GeometryMember) -> bool {
        if !self.enabled {
            return false;
        }
        let id = member.id();
        self.subscriptions.subscribe(id, Subscription::BOUND_CHANGED);

        let added = match self.withdraw() {
            Some(mut tree) => {
                if Arc::make_mut(&mut tree).add(OctreeItem::new(id, member.bounds())) {
                    self.publish(tree);
                    true
                } else {
                    false
                }
            }
            None => false,
        };

        if !added {
            log::debug!("Member {:?} could not be added incrementally, rebuild owed", id);
            self.request_rebuild();
        }
        added
    }

    /// Stop tracking an element and take it out of the tree
    ///
    /// All subscriptions for the member are cancelled first. A removal that
    /// cannot find the member is reported, not fatal.
    pub fn remove_item<E: SceneElement + ?Sized>(&mut self, element: &E) -> Result<(), OctreeError> {
        let Some(member) = element.as_geometry() else {
            return Ok(());
        };
        let id = member.id();
        self.subscriptions.cancel(id);

        let Some(mut tree) = self.withdraw() else {
            return Ok(());
        };
        let octree = Arc::make_mut(&mut tree);
        let mut removed = octree.remove_by_bound(id, &member.bounds());
        if !removed {
            // The live bound can run ahead of the indexed one while a change
            // is still queued
            log::warn!("Member {:?} not found by its current bound, searching the tree", id);
            if let Some(location) = octree.locate(id) {
                removed = octree.remove_at(&location).is_some();
            }
        }
        self.publish(tree);

        if removed {
            Ok(())
        } else {
            log::warn!("Remove failed: member {:?} not found in octree", id);
            Err(OctreeError::MemberNotFound { id })
        }
    }

    /// Drop the tree and mark a full rebuild as owed
    pub fn request_rebuild(&mut self) {
        self.clear();
        self.request_update_octree = true;
        self.state = ManagerState::RebuildPending;
    }

    /// Drop the tree unconditionally
    ///
    /// While disabled this also cancels every subscription so no further
    /// notifications are acted on.
    pub fn clear(&mut self) {
        self.request_update_octree = false;
        self.handle.store(None);
        self.state = ManagerState::Empty;
        if !self.enabled {
            self.subscriptions.clear();
        }
    }
}
