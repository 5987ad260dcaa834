//! Octree spatial partitioning structure
//!
//! Owns the root node and the parameters it was built with. Building from a
//! member list sizes the root to enclose every valid member; after that the
//! tree is patched incrementally and only rebuilt when a member escapes the
//! root octant.

use super::bounds::BoundingBox;
use super::member::MemberId;
use super::node::{NodeLocation, OctreeItem, OctreeNode};
use super::parameters::OctreeBuildParameter;

/// Octree over member bounds
#[derive(Debug, Clone)]
pub struct Octree {
    /// Root node containing every member
    root: OctreeNode,

    /// Parameters used for every structural change
    params: OctreeBuildParameter,

    /// Whether the last build produced a usable tree
    tree_built: bool,
}

impl Octree {
    /// Create an empty octree over fixed bounds
    ///
    /// Useful when the extent is known up front; members are then added one
    /// at a time with [`Octree::add`].
    pub fn new(bound: BoundingBox, params: OctreeBuildParameter) -> Self {
        let bound = if params.cubify { bound.cubify() } else { bound };
        Self {
            root: OctreeNode::new(bound, 0),
            params,
            tree_built: bound.is_valid(),
        }
    }

    /// Build a tree enclosing every item with a valid bound
    ///
    /// Items with empty, inverted or non-finite bounds are skipped. Check
    /// [`Octree::tree_built`] afterwards: it is false when nothing was left to
    /// index.
    pub fn build<I>(items: I, params: OctreeBuildParameter) -> Self
    where
        I: IntoIterator<Item = OctreeItem>,
    {
        let items: Vec<OctreeItem> = items
            .into_iter()
            .filter(|item| {
                let valid = item.bound.is_valid();
                if !valid {
                    log::warn!("Skipping member {:?} with invalid bound {:?}", item.id, item.bound);
                }
                valid
            })
            .collect();

        let Some(bound) = items.iter().map(|item| item.bound).reduce(|a, b| a.merge(&b)) else {
            log::debug!("Octree build skipped: no members with valid bounds");
            return Self {
                root: OctreeNode::new(BoundingBox::empty(), 0),
                params,
                tree_built: false,
            };
        };

        let bound = if params.cubify { bound.cubify() } else { bound };
        let mut root = OctreeNode::new(bound, 0);
        for item in items {
            if !root.try_add(item, &params) {
                log::warn!("Member {:?} did not fit the root octant during build", item.id);
            }
        }

        let tree_built = root.item_count() > 0;
        log::debug!(
            "Built octree: {} members, {} nodes, depth {}",
            root.item_count(),
            root.node_count(),
            root.max_depth()
        );

        Self { root, params, tree_built }
    }

    /// Whether the build produced a non-empty, valid tree
    pub fn tree_built(&self) -> bool {
        self.tree_built
    }

    /// Insert an item through the root
    ///
    /// False means the bound lies (partly) outside the root octant and the
    /// tree has to be rebuilt to take it.
    pub fn add(&mut self, item: OctreeItem) -> bool {
        if !item.bound.is_valid() {
            log::warn!("Refusing to add member {:?} with invalid bound {:?}", item.id, item.bound);
            return false;
        }
        self.root.try_add(item, &self.params)
    }

    /// Remove a member by descending with its current bound
    ///
    /// False means the member is not where that bound says it should be.
    pub fn remove_by_bound(&mut self, id: MemberId, bound: &BoundingBox) -> bool {
        self.root.remove_by_bound(id, bound, &self.params)
    }

    /// Locate a member by the bound it was inserted with
    pub fn find_child_by_item_bound(&self, id: MemberId, old_bound: &BoundingBox) -> Option<NodeLocation> {
        self.root.find_child_by_item_bound(id, old_bound)
    }

    /// Exhaustive search for a member
    pub fn locate(&self, id: MemberId) -> Option<NodeLocation> {
        self.root.locate(id)
    }

    /// Node that holds the item at `location`
    pub fn node(&self, location: &NodeLocation) -> Option<&OctreeNode> {
        self.root.descend(&location.path)
    }

    /// Insert at the node a previous lookup returned
    ///
    /// False when the item does not fit that node's octant.
    pub fn add_at(&mut self, location: &NodeLocation, item: OctreeItem) -> bool {
        self.root.add_along_path(&location.path, item, &self.params)
    }

    /// Remove the item a previous lookup returned
    pub fn remove_at(&mut self, location: &NodeLocation) -> Option<OctreeItem> {
        self.root.remove_along_path(&location.path, location.index, &self.params)
    }

    /// Root node
    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    /// Root octant
    pub fn bound(&self) -> &BoundingBox {
        self.root.bound()
    }

    /// Parameters this tree was built with
    pub fn parameters(&self) -> &OctreeBuildParameter {
        &self.params
    }

    /// Get total member count
    pub fn item_count(&self) -> usize {
        self.root.item_count()
    }

    /// True when no member is indexed
    pub fn is_empty(&self) -> bool {
        self.root.item_count() == 0
    }

    /// Total nodes including the root
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Depth of the deepest node (root = 0)
    pub fn depth(&self) -> u32 {
        self.root.max_depth()
    }

    /// Get all leaf nodes (for visualization)
    pub fn leaves(&self) -> Vec<&OctreeNode> {
        let mut leaves = Vec::new();
        self.root.get_all_leaves(&mut leaves);
        leaves
    }

    /// Get all nodes at a specific depth (for visualization)
    pub fn nodes_at_depth(&self, depth: u32) -> Vec<&OctreeNode> {
        let mut nodes = Vec::new();
        self.root.get_nodes_at_depth(depth, &mut nodes);
        nodes
    }

    /// Octant of every node, parents first (for debug drawing)
    pub fn octant_bounds(&self) -> Vec<BoundingBox> {
        let mut bounds = Vec::with_capacity(self.root.node_count());
        self.root.visit(&mut |node| bounds.push(*node.bound()));
        bounds
    }

    /// Every indexed item with the location holding it
    pub fn items(&self) -> Vec<(OctreeItem, BoundingBox)> {
        let mut items = Vec::with_capacity(self.root.item_count());
        self.root.visit(&mut |node| {
            items.extend(node.items().iter().map(|item| (*item, *node.bound())));
        });
        items
    }

    /// Drop every member, keeping the root octant
    pub fn clear(&mut self) {
        self.root = OctreeNode::new(*self.root.bound(), 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<MemberId> {
        let mut map: SlotMap<MemberId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn unit_at(x: f32, y: f32, z: f32) -> BoundingBox {
        BoundingBox::new(Vec3::new(x, y, z), Vec3::new(x + 1.0, y + 1.0, z + 1.0))
    }

    #[test]
    fn test_build_encloses_members() {
        let members = ids(3);
        let items = vec![
            OctreeItem::new(members[0], unit_at(0.0, 0.0, 0.0)),
            OctreeItem::new(members[1], unit_at(20.0, 5.0, 3.0)),
            OctreeItem::new(members[2], unit_at(-4.0, 9.0, 0.0)),
        ];
        let octree = Octree::build(items.clone(), OctreeBuildParameter::default());

        assert!(octree.tree_built());
        assert_eq!(octree.item_count(), 3);
        for item in &items {
            assert!(octree.bound().contains_box(&item.bound));
            assert!(octree.find_child_by_item_bound(item.id, &item.bound).is_some());
        }
    }

    #[test]
    fn test_build_cubified_root_is_cube() {
        let members = ids(2);
        let items = vec![
            OctreeItem::new(members[0], unit_at(0.0, 0.0, 0.0)),
            OctreeItem::new(members[1], unit_at(15.0, 1.0, 3.0)),
        ];
        let params = OctreeBuildParameter { cubify: true, ..Default::default() };
        let octree = Octree::build(items, params);

        let size = octree.bound().size();
        assert!((size.x - size.y).abs() < 1e-4 && (size.y - size.z).abs() < 1e-4);
        assert!((size.x - 16.0).abs() < 1e-4);
        for node in octree.octant_bounds() {
            let s = node.size();
            assert!((s.x - s.y).abs() < 1e-4 && (s.y - s.z).abs() < 1e-4);
        }
    }

    #[test]
    fn test_build_empty_or_degenerate_is_not_built() {
        let empty = Octree::build(Vec::new(), OctreeBuildParameter::default());
        assert!(!empty.tree_built());

        let members = ids(2);
        let degenerate = Octree::build(
            vec![
                OctreeItem::new(members[0], BoundingBox::empty()),
                OctreeItem::new(members[1], BoundingBox::new(Vec3::repeat(f32::NAN), Vec3::repeat(1.0))),
            ],
            OctreeBuildParameter::default(),
        );
        assert!(!degenerate.tree_built());
        assert_eq!(degenerate.item_count(), 0);
    }

    #[test]
    fn test_build_skips_invalid_but_keeps_valid() {
        let members = ids(2);
        let octree = Octree::build(
            vec![
                OctreeItem::new(members[0], BoundingBox::empty()),
                OctreeItem::new(members[1], unit_at(3.0, 3.0, 3.0)),
            ],
            OctreeBuildParameter::default(),
        );
        assert!(octree.tree_built());
        assert_eq!(octree.item_count(), 1);
        assert!(octree.locate(members[0]).is_none());
    }

    #[test]
    fn test_add_outside_root_fails() {
        let members = ids(2);
        let mut octree = Octree::new(
            BoundingBox::new(Vec3::zeros(), Vec3::repeat(10.0)),
            OctreeBuildParameter::default(),
        );

        assert!(octree.add(OctreeItem::new(members[0], unit_at(2.0, 2.0, 2.0))));
        assert!(!octree.add(OctreeItem::new(members[1], unit_at(9.5, 2.0, 2.0))));
        assert!(!octree.add(OctreeItem::new(members[1], BoundingBox::empty())));
        assert_eq!(octree.item_count(), 1);
    }

    #[test]
    fn test_remove_by_bound_reports_missing() {
        let members = ids(2);
        let mut octree = Octree::build(
            vec![
                OctreeItem::new(members[0], unit_at(0.0, 0.0, 0.0)),
                OctreeItem::new(members[1], unit_at(8.0, 8.0, 8.0)),
            ],
            OctreeBuildParameter::default(),
        );

        assert!(octree.remove_by_bound(members[0], &unit_at(0.0, 0.0, 0.0)));
        assert!(!octree.remove_by_bound(members[0], &unit_at(0.0, 0.0, 0.0)));
        assert_eq!(octree.item_count(), 1);
    }

    #[test]
    fn test_add_at_then_remove_at_relocates_in_place() {
        let members = ids(1);
        let id = members[0];
        let old = unit_at(1.0, 1.0, 1.0);
        let mut octree = Octree::new(
            BoundingBox::new(Vec3::zeros(), Vec3::repeat(16.0)),
            OctreeBuildParameter { min_octant_size: 4.0, ..Default::default() },
        );
        assert!(octree.add(OctreeItem::new(id, old)));

        let location = octree.find_child_by_item_bound(id, &old).expect("located");
        let holder = *octree.node(&location).expect("holder").bound();
        let shrunk = BoundingBox::new(Vec3::repeat(1.25), Vec3::repeat(1.75));
        assert!(holder.contains_box(&shrunk));

        assert!(octree.add_at(&location, OctreeItem::new(id, shrunk)));
        assert_eq!(octree.remove_at(&location).map(|item| item.bound), Some(old));
        assert_eq!(octree.item_count(), 1);
        assert!(octree.find_child_by_item_bound(id, &shrunk).is_some());
    }

    #[test]
    fn test_leaves_and_levels_cover_the_root() {
        let members = ids(2);
        let octree = Octree::build(
            vec![
                OctreeItem::new(members[0], unit_at(0.0, 0.0, 0.0)),
                OctreeItem::new(members[1], unit_at(7.0, 7.0, 7.0)),
            ],
            OctreeBuildParameter { min_octant_size: 2.0, ..Default::default() },
        );

        // Root [0,8]^3 splits twice before children would drop below 2
        assert_eq!(octree.depth(), 2);
        assert_eq!(octree.nodes_at_depth(0).len(), 1);
        assert_eq!(octree.nodes_at_depth(1).len(), 8);
        assert_eq!(octree.nodes_at_depth(2).len(), 16);

        let leaves = octree.leaves();
        assert_eq!(leaves.len(), 6 + 16);
        let volume: f32 = leaves.iter().map(|leaf| leaf.bound().size().product()).sum();
        assert!((volume - 512.0).abs() < 1e-3);
        assert_eq!(leaves.iter().map(|leaf| leaf.item_count()).sum::<usize>(), 2);
        assert_eq!(octree.octant_bounds().len(), octree.node_count());
    }

    #[test]
    fn test_build_far_from_origin_terminates() {
        let members = ids(3);
        let far = BoundingBox::new(Vec3::repeat(1e8), Vec3::repeat(1e8 + 8.0));
        let wide = BoundingBox::new(Vec3::repeat(1e8), Vec3::repeat(1e8 + 1024.0));
        let small = BoundingBox::new(Vec3::repeat(1e8 + 512.0), Vec3::repeat(1e8 + 520.0));

        for cubify in [false, true] {
            let params = OctreeBuildParameter { cubify, ..Default::default() };
            let octree = Octree::build(
                vec![
                    OctreeItem::new(members[0], far),
                    OctreeItem::new(members[1], wide),
                    OctreeItem::new(members[2], small),
                ],
                params,
            );

            assert!(octree.tree_built());
            assert_eq!(octree.item_count(), 3);
            // 1024 / 8 = 2^7: splitting stops once the f32 spacing is reached
            assert!(octree.depth() <= 8, "depth {}", octree.depth());
            assert!(octree.find_child_by_item_bound(members[2], &small).is_some());
        }
    }

    #[test]
    fn test_clear_keeps_root_bound() {
        let members = ids(1);
        let mut octree = Octree::build(
            vec![OctreeItem::new(members[0], unit_at(0.0, 0.0, 0.0))],
            OctreeBuildParameter::default(),
        );
        let bound = *octree.bound();
        octree.clear();

        assert!(octree.is_empty());
        assert_eq!(octree.node_count(), 1);
        assert_eq!(*octree.bound(), bound);
    }
}
