//! Octree node: one octant, the members that fit it, and 0 or 8 children
//!
//! A member is stored in the deepest node whose octant fully contains its
//! bound. Members that straddle a split plane stay at the parent rather than
//! being forced into one child.

use super::bounds::{self, BoundingBox};
use super::member::MemberId;
use super::parameters::OctreeBuildParameter;
use crate::foundation::math::Vec3;

/// A member as the tree sees it: identity plus the bound it was inserted with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeItem {
    /// Member identity
    pub id: MemberId,
    /// Bound at insertion time. Used to find the member again after its live
    /// bound has moved on.
    pub bound: BoundingBox,
}

impl OctreeItem {
    /// Create an item
    pub fn new(id: MemberId, bound: BoundingBox) -> Self {
        Self { id, bound }
    }
}

/// Where an item lives: child indices from the root, then the index into that
/// node's own item list
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NodeLocation {
    /// Octant index (0-7) taken at each level below the root
    pub path: Vec<u8>,
    /// Index into the node's own item list
    pub index: usize,
}

impl NodeLocation {
    /// Depth of the holding node (root = 0)
    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// Single node in the octree hierarchy
#[derive(Debug, Clone)]
pub struct OctreeNode {
    /// World-space octant of this node
    bound: BoundingBox,

    /// Members held directly by this node, in insertion order
    items: Vec<OctreeItem>,

    /// Child nodes (8 octants), None if this is a leaf
    children: Option<Box<[OctreeNode; 8]>>,

    /// Members in this node and all descendants
    item_count: usize,

    /// Depth in the tree (0 = root)
    depth: u32,
}

impl OctreeNode {
    /// Create a new leaf node
    pub fn new(bound: BoundingBox, depth: u32) -> Self {
        Self {
            bound,
            items: Vec::new(),
            children: None,
            item_count: 0,
            depth,
        }
    }

    /// Octant covered by this node
    pub fn bound(&self) -> &BoundingBox {
        &self.bound
    }

    /// Members held directly by this node
    pub fn items(&self) -> &[OctreeItem] {
        &self.items
    }

    /// The eight children, if subdivided
    pub fn children(&self) -> Option<&[OctreeNode; 8]> {
        self.children.as_deref()
    }

    /// Members in this subtree
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    /// Depth in the tree (0 = root)
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Check if this node is a leaf (has no children)
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Whether splitting keeps the children at or above the minimum size
    ///
    /// The split point must also fall strictly inside the box on every
    /// longest axis. Far from the origin the center can round onto a face,
    /// and a child would then be as large as its parent.
    fn can_subdivide(&self, params: &OctreeBuildParameter) -> bool {
        let longest = self.bound.max_dimension();
        if longest * 0.5 < params.min_octant_size {
            return false;
        }
        let split = if params.cubify { self.bound.cubify() } else { self.bound };
        let center = split.center();
        let size = self.bound.size();
        (0..3).all(|axis| {
            size[axis] < longest || (self.bound.min[axis] < center[axis] && center[axis] < self.bound.max[axis])
        })
    }

    /// Create the eight children
    ///
    /// Own items are not redistributed: a leaf only holds items after its
    /// children were pruned, and those items straddle the same octants.
    fn subdivide(&mut self, params: &OctreeBuildParameter) {
        if self.children.is_some() {
            return;
        }
        let depth = self.depth + 1;
        let parent = self.bound;
        let octants = bounds::subdivide(&parent, params.cubify);
        // A cube hull may overshoot a near-cube parent by rounding
        self.children = Some(Box::new(
            octants.map(|octant| OctreeNode::new(octant.clamp_to(&parent), depth)),
        ));
    }

    /// Drop the children once none of them holds anything
    fn prune_if_empty(&mut self, params: &OctreeBuildParameter) {
        if !params.auto_delete_if_empty {
            return;
        }
        let empty = self
            .children
            .as_ref()
            .is_some_and(|children| children.iter().all(|child| child.item_count == 0));
        if empty {
            self.children = None;
        }
    }

    /// Place an item into this node or a descendant
    ///
    /// Returns false only when the item's bound is not contained in this
    /// node's octant; the caller has to escalate (higher ancestor or rebuild).
    pub fn try_add(&mut self, item: OctreeItem, params: &OctreeBuildParameter) -> bool {
        if !self.bound.contains_box(&item.bound) {
            return false;
        }

        if self.is_leaf() && self.can_subdivide(params) {
            self.subdivide(params);
        }

        if let Some(children) = self.children.as_mut() {
            // Octants don't overlap, so at most one can fully contain a
            // non-flat box; first match wins for boxes lying on a split plane
            if let Some(child) = children.iter_mut().find(|c| c.bound.contains_box(&item.bound)) {
                if child.try_add(item, params) {
                    self.item_count += 1;
                    return true;
                }
            }
        }

        self.items.push(item);
        self.item_count += 1;
        true
    }

    /// Remove one of this node's own items by index
    ///
    /// Only this node's count is adjusted; ancestors are the caller's job.
    pub fn remove_at(&mut self, index: usize, params: &OctreeBuildParameter) -> Option<OctreeItem> {
        if index >= self.items.len() {
            return None;
        }
        let item = self.items.remove(index);
        self.item_count -= 1;
        self.prune_if_empty(params);
        Some(item)
    }

    /// Remove a member by re-descending with its current bound
    pub fn remove_by_bound(
        &mut self,
        id: MemberId,
        bound: &BoundingBox,
        params: &OctreeBuildParameter,
    ) -> bool {
        if !self.bound.contains_box(bound) {
            return false;
        }

        if let Some(index) = self.items.iter().position(|item| item.id == id) {
            return self.remove_at(index, params).is_some();
        }

        let removed = self
            .children
            .as_mut()
            .and_then(|children| children.iter_mut().find(|c| c.bound.contains_box(bound)))
            .is_some_and(|child| child.remove_by_bound(id, bound, params));

        if removed {
            self.item_count -= 1;
            self.prune_if_empty(params);
        }
        removed
    }

    /// Locate the node holding `id`, descending by the bound the member had
    /// when it was inserted
    ///
    /// The returned path is relative to this node.
    pub fn find_child_by_item_bound(&self, id: MemberId, old_bound: &BoundingBox) -> Option<NodeLocation> {
        let mut path = Vec::new();
        let mut node = self;
        loop {
            if !node.bound.contains_box(old_bound) {
                return None;
            }
            if let Some(index) = node.items.iter().position(|item| item.id == id) {
                return Some(NodeLocation { path, index });
            }
            let (octant, child) = node
                .children
                .as_ref()?
                .iter()
                .enumerate()
                .find(|(_, c)| c.bound.contains_box(old_bound))?;
            path.push(octant as u8);
            node = child;
        }
    }

    /// Exhaustive search for `id`, ignoring bounds
    pub fn locate(&self, id: MemberId) -> Option<NodeLocation> {
        if let Some(index) = self.items.iter().position(|item| item.id == id) {
            return Some(NodeLocation { path: Vec::new(), index });
        }
        self.children.as_ref()?.iter().enumerate().find_map(|(octant, child)| {
            child.locate(id).map(|mut location| {
                location.path.insert(0, octant as u8);
                location
            })
        })
    }

    /// Follow a child path
    pub fn descend(&self, path: &[u8]) -> Option<&OctreeNode> {
        path.iter().try_fold(self, |node, &octant| {
            node.children.as_ref().map(|children| &children[usize::from(octant) & 7])
        })
    }

    /// `try_add` at the node at `path`, bumping the count of every node on the
    /// way down when it succeeds
    pub(super) fn add_along_path(
        &mut self,
        path: &[u8],
        item: OctreeItem,
        params: &OctreeBuildParameter,
    ) -> bool {
        let Some((&octant, rest)) = path.split_first() else {
            return self.try_add(item, params);
        };
        let Some(children) = self.children.as_mut() else {
            return false;
        };
        let added = children[usize::from(octant) & 7].add_along_path(rest, item, params);
        if added {
            self.item_count += 1;
        }
        added
    }

    /// `remove_at` at the node at `path`, fixing counts and pruning on the way
    /// back up
    pub(super) fn remove_along_path(
        &mut self,
        path: &[u8],
        index: usize,
        params: &OctreeBuildParameter,
    ) -> Option<OctreeItem> {
        let Some((&octant, rest)) = path.split_first() else {
            return self.remove_at(index, params);
        };
        let children = self.children.as_mut()?;
        let removed = children[usize::from(octant) & 7].remove_along_path(rest, index, params)?;
        self.item_count -= 1;
        self.prune_if_empty(params);
        Some(removed)
    }

    /// Members whose stored bound contains `point`
    pub fn query_point(&self, point: &Vec3, results: &mut Vec<MemberId>) {
        if !self.bound.contains_point(point) {
            return;
        }
        results.extend(
            self.items
                .iter()
                .filter(|item| item.bound.contains_point(point))
                .map(|item| item.id),
        );
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.query_point(point, results);
            }
        }
    }

    /// Members whose stored bound intersects `volume`
    pub fn query_volume(&self, volume: &BoundingBox, results: &mut Vec<MemberId>) {
        if !self.bound.intersects(volume) {
            return;
        }
        results.extend(
            self.items
                .iter()
                .filter(|item| item.bound.intersects(volume))
                .map(|item| item.id),
        );
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.query_volume(volume, results);
            }
        }
    }

    /// Members whose stored bound touches the sphere
    pub fn query_sphere(&self, center: &Vec3, radius: f32, results: &mut Vec<MemberId>) {
        // Quick AABB check - if sphere doesn't touch node bounds, skip
        if !self.bound.intersects_sphere(center, radius) {
            return;
        }
        results.extend(
            self.items
                .iter()
                .filter(|item| item.bound.intersects_sphere(center, radius))
                .map(|item| item.id),
        );
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.query_sphere(center, radius, results);
            }
        }
    }

    /// Collect `(member, entry distance)` for every stored bound the ray
    /// enters, optionally recording each visited octant
    pub fn hit_test(
        &self,
        ray_origin: &Vec3,
        ray_dir: &Vec3,
        hits: &mut Vec<(MemberId, f32)>,
        mut hit_path: Option<&mut Vec<BoundingBox>>,
    ) {
        if self.bound.intersect_ray(ray_origin, ray_dir).is_none() {
            return;
        }
        if let Some(path) = hit_path.as_deref_mut() {
            path.push(self.bound);
        }
        hits.extend(self.items.iter().filter_map(|item| {
            item.bound
                .intersect_ray(ray_origin, ray_dir)
                .map(|distance| (item.id, distance))
        }));
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.hit_test(ray_origin, ray_dir, hits, hit_path.as_deref_mut());
            }
        }
    }

    /// Get all leaf nodes (for visualization)
    pub fn get_all_leaves<'a>(&'a self, leaves: &mut Vec<&'a OctreeNode>) {
        match self.children.as_ref() {
            None => leaves.push(self),
            Some(children) => {
                for child in children.iter() {
                    child.get_all_leaves(leaves);
                }
            }
        }
    }

    /// Get all nodes at a specific depth (for visualization)
    pub fn get_nodes_at_depth<'a>(&'a self, target_depth: u32, nodes: &mut Vec<&'a OctreeNode>) {
        if self.depth == target_depth {
            nodes.push(self);
        } else if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.get_nodes_at_depth(target_depth, nodes);
            }
        }
    }

    /// Visit this node and every descendant, parents first
    pub fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a OctreeNode)) {
        f(self);
        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.visit(f);
            }
        }
    }

    /// Nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |children| children.iter().map(OctreeNode::node_count).sum())
    }

    /// Deepest node depth in this subtree
    pub fn max_depth(&self) -> u32 {
        self.children.as_ref().map_or(self.depth, |children| {
            children.iter().map(OctreeNode::max_depth).max().unwrap_or(self.depth)
        })
    }
}
