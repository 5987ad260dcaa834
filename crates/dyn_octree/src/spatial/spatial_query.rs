//! Read-side spatial query interface
//!
//! Consumers query whatever index is available: the published [`Octree`] when
//! there is one, or a [`LinearScan`] over the raw members while the tree is
//! withdrawn or owed a rebuild. Both answer the same questions with the same
//! results; the octree is just faster.

use super::bounds::BoundingBox;
use super::member::{GeometryMember, MemberId};
use super::node::OctreeItem;
use super::octree::Octree;
use crate::foundation::math::Vec3;

/// One member hit by a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Member hit
    pub id: MemberId,
    /// Distance along the ray direction to the bound's entry point
    pub distance: f32,
}

/// Result of a ray hit test
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HitTestResult {
    /// Members whose bound the ray enters, nearest first
    pub hits: Vec<RayHit>,
    /// Octants visited on the way, in visit order. Only filled when the tree
    /// was built with `record_hit_path_bounding_boxes`.
    pub hit_path: Vec<BoundingBox>,
}

impl HitTestResult {
    fn from_raw(mut raw: Vec<(MemberId, f32)>, hit_path: Vec<BoundingBox>) -> Self {
        raw.sort_by(|a, b| a.1.total_cmp(&b.1));
        Self {
            hits: raw.into_iter().map(|(id, distance)| RayHit { id, distance }).collect(),
            hit_path,
        }
    }

    /// Closest hit, if any
    pub fn nearest(&self) -> Option<&RayHit> {
        self.hits.first()
    }
}

/// Abstract interface over a spatial index of member bounds
pub trait SpatialQuery {
    /// Members whose bound contains `point`
    fn query_point(&self, point: &Vec3) -> Vec<MemberId>;

    /// Members whose bound intersects `volume`
    fn query_volume(&self, volume: &BoundingBox) -> Vec<MemberId>;

    /// Members whose bound touches the sphere
    fn query_sphere(&self, center: &Vec3, radius: f32) -> Vec<MemberId>;

    /// Members whose bound the ray enters, nearest first
    fn hit_test(&self, ray_origin: &Vec3, ray_dir: &Vec3) -> HitTestResult;

    /// Number of indexed members
    fn member_count(&self) -> usize;
}

impl SpatialQuery for Octree {
    fn query_point(&self, point: &Vec3) -> Vec<MemberId> {
        let mut results = Vec::new();
        self.root().query_point(point, &mut results);
        results
    }

    fn query_volume(&self, volume: &BoundingBox) -> Vec<MemberId> {
        let mut results = Vec::new();
        self.root().query_volume(volume, &mut results);
        results
    }

    fn query_sphere(&self, center: &Vec3, radius: f32) -> Vec<MemberId> {
        let mut results = Vec::new();
        self.root().query_sphere(center, radius, &mut results);
        results
    }

    fn hit_test(&self, ray_origin: &Vec3, ray_dir: &Vec3) -> HitTestResult {
        let mut hits = Vec::new();
        let mut hit_path = Vec::new();
        let record = self.parameters().record_hit_path_bounding_boxes;
        self.root().hit_test(ray_origin, ray_dir, &mut hits, record.then_some(&mut hit_path));
        HitTestResult::from_raw(hits, hit_path)
    }

    fn member_count(&self) -> usize {
        self.item_count()
    }
}

/// Brute-force fallback used while no tree is published
#[derive(Debug, Clone, Default)]
pub struct LinearScan {
    items: Vec<OctreeItem>,
}

impl LinearScan {
    /// Scan over explicit items
    pub fn new(items: Vec<OctreeItem>) -> Self {
        Self { items }
    }

    /// Scan over members' current bounds, skipping unmeasured ones
    pub fn from_members<'a, I>(members: I) -> Self
    where
        I: IntoIterator<Item = &'a dyn GeometryMember>,
    {
        Self {
            items: members
                .into_iter()
                .map(|member| OctreeItem::new(member.id(), member.bounds()))
                .filter(|item| item.bound.is_valid())
                .collect(),
        }
    }

    /// Items scanned
    pub fn items(&self) -> &[OctreeItem] {
        &self.items
    }

    fn matching(&self, predicate: impl Fn(&BoundingBox) -> bool) -> Vec<MemberId> {
        self.items
            .iter()
            .filter(|item| predicate(&item.bound))
            .map(|item| item.id)
            .collect()
    }
}

impl SpatialQuery for LinearScan {
    fn query_point(&self, point: &Vec3) -> Vec<MemberId> {
        self.matching(|bound| bound.contains_point(point))
    }

    fn query_volume(&self, volume: &BoundingBox) -> Vec<MemberId> {
        self.matching(|bound| bound.intersects(volume))
    }

    fn query_sphere(&self, center: &Vec3, radius: f32) -> Vec<MemberId> {
        self.matching(|bound| bound.intersects_sphere(center, radius))
    }

    fn hit_test(&self, ray_origin: &Vec3, ray_dir: &Vec3) -> HitTestResult {
        let hits = self
            .items
            .iter()
            .filter_map(|item| {
                item.bound
                    .intersect_ray(ray_origin, ray_dir)
                    .map(|distance| (item.id, distance))
            })
            .collect();
        HitTestResult::from_raw(hits, Vec::new())
    }

    fn member_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::OctreeBuildParameter;
    use slotmap::SlotMap;

    fn scene() -> Vec<OctreeItem> {
        let mut map: SlotMap<MemberId, ()> = SlotMap::with_key();
        (0..6)
            .map(|i| {
                let x = i as f32 * 3.0;
                OctreeItem::new(
                    map.insert(()),
                    BoundingBox::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0)),
                )
            })
            .collect()
    }

    #[test]
    fn test_octree_matches_linear_scan() {
        let items = scene();
        let octree = Octree::build(items.clone(), OctreeBuildParameter::default());
        let scan = LinearScan::new(items);

        let mut a = octree.query_volume(&BoundingBox::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(7.0, 1.0, 1.0)));
        let mut b = scan.query_volume(&BoundingBox::new(Vec3::new(2.0, 0.0, 0.0), Vec3::new(7.0, 1.0, 1.0)));
        a.sort();
        b.sort();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);

        assert_eq!(octree.query_point(&Vec3::new(9.5, 0.5, 0.5)), scan.query_point(&Vec3::new(9.5, 0.5, 0.5)));
        assert_eq!(octree.member_count(), scan.member_count());
    }

    #[test]
    fn test_hit_test_sorted_nearest_first() {
        let items = scene();
        let octree = Octree::build(items.clone(), OctreeBuildParameter::default());

        let result = octree.hit_test(&Vec3::new(20.0, 0.5, 0.5), &Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(result.hits.len(), items.len());
        assert_eq!(result.nearest().map(|hit| hit.id), Some(items[5].id));
        assert!(result.hits.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
        assert!(result.hit_path.is_empty());
    }

    #[test]
    fn test_hit_path_recorded_only_when_enabled() {
        let items = scene();
        let params = OctreeBuildParameter { record_hit_path_bounding_boxes: true, ..Default::default() };
        let octree = Octree::build(items.clone(), params);

        let ray_origin = Vec3::new(-5.0, 0.5, 0.5);
        let ray_dir = Vec3::new(1.0, 0.0, 0.0);
        let recorded = octree.hit_test(&ray_origin, &ray_dir);
        assert_eq!(recorded.hit_path.first(), Some(octree.bound()));
        for octant in &recorded.hit_path {
            assert!(octant.intersect_ray(&ray_origin, &ray_dir).is_some());
        }

        // Recording does not change what is hit
        let plain = Octree::build(items, OctreeBuildParameter::default()).hit_test(&ray_origin, &ray_dir);
        assert_eq!(recorded.hits, plain.hits);
    }

    #[test]
    fn test_linear_scan_skips_unmeasured_members() {
        struct Probe(MemberId, BoundingBox);
        impl GeometryMember for Probe {
            fn id(&self) -> MemberId {
                self.0
            }
            fn bounds(&self) -> BoundingBox {
                self.1
            }
        }

        let items = scene();
        let measured = Probe(items[0].id, items[0].bound);
        let pending = Probe(items[1].id, BoundingBox::empty());
        let members: Vec<&dyn GeometryMember> = vec![&measured, &pending];

        let scan = LinearScan::from_members(members);
        assert_eq!(scan.member_count(), 1);
        assert_eq!(scan.items()[0].id, items[0].id);
    }
}
