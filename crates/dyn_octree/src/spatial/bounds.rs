//! Axis-aligned bounding boxes and the octant math built on top of them
//!
//! Everything here is a pure function of its inputs. The octree algorithms
//! only ever ask three questions of a box: does it contain another box, what
//! are its eight octants, and what is its cube hull.

use crate::foundation::math::{utils, Vec3};

/// Result of a three-way containment test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainmentType {
    /// The boxes do not overlap at all
    Disjoint,
    /// The boxes overlap but the inner box pokes out on at least one axis
    Intersects,
    /// The inner box lies entirely inside the outer box (touching faces count)
    Contains,
}

/// Axis-aligned bounding box
///
/// The all-zero box is the "uninitialized" sentinel; see [`BoundingBox::is_empty`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a new bounding box from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The uninitialized sentinel (both corners at the origin)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a box centered at a point with given half-size
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box enclosing all given points, `None` for an empty iterator
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |acc, p| Self {
            min: utils::component_min(&acc.min, &p),
            max: utils::component_max(&acc.max, &p),
        }))
    }

    /// Get the center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Full edge lengths
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the extents (half-size) of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Longest edge
    pub fn max_dimension(&self) -> f32 {
        utils::max_component(&self.size())
    }

    /// Zero extent on every axis. Such a box has not been measured yet and is
    /// never inserted into a tree.
    pub fn is_empty(&self) -> bool {
        self.min == self.max
    }

    /// Finite, non-inverted and not empty
    pub fn is_valid(&self) -> bool {
        utils::is_finite(&self.min)
            && utils::is_finite(&self.max)
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.min.z <= self.max.z
            && !self.is_empty()
    }

    /// Check if this box contains a point (boundary inclusive)
    pub fn contains_point(&self, point: &Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this box intersects another box (touching counts)
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Three-way containment test of `other` against `self`
    pub fn contains(&self, other: &Self) -> ContainmentType {
        if !self.intersects(other) {
            ContainmentType::Disjoint
        } else if self.contains_point(&other.min) && self.contains_point(&other.max) {
            ContainmentType::Contains
        } else {
            ContainmentType::Intersects
        }
    }

    /// Shorthand for `contains(other) == Contains`
    pub fn contains_box(&self, other: &Self) -> bool {
        self.contains(other) == ContainmentType::Contains
    }

    /// Smallest box enclosing both
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: utils::component_min(&self.min, &other.min),
            max: utils::component_max(&self.max, &other.max),
        }
    }

    /// Closest point of the box to `point`
    pub fn closest_point(&self, point: &Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
            point.z.clamp(self.min.z, self.max.z),
        )
    }

    /// Check whether a sphere touches the box
    pub fn intersects_sphere(&self, center: &Vec3, radius: f32) -> bool {
        (self.closest_point(center) - center).magnitude_squared() <= radius * radius
    }

    /// Test ray intersection with this box using the slab method
    ///
    /// Returns the distance along `ray_dir` to the entry point (0 when the
    /// origin is inside), or `None` on a miss.
    pub fn intersect_ray(&self, ray_origin: &Vec3, ray_dir: &Vec3) -> Option<f32> {
        let inv_dir = Vec3::new(
            if ray_dir.x != 0.0 { 1.0 / ray_dir.x } else { f32::INFINITY },
            if ray_dir.y != 0.0 { 1.0 / ray_dir.y } else { f32::INFINITY },
            if ray_dir.z != 0.0 { 1.0 / ray_dir.z } else { f32::INFINITY },
        );

        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;
        for axis in 0..3 {
            if ray_dir[axis] == 0.0 {
                // Parallel to the slab: either always inside it or never
                if ray_origin[axis] < self.min[axis] || ray_origin[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }
            let t1 = (self.min[axis] - ray_origin[axis]) * inv_dir[axis];
            let t2 = (self.max[axis] - ray_origin[axis]) * inv_dir[axis];
            tmin = tmin.max(t1.min(t2));
            tmax = tmax.min(t1.max(t2));
        }

        if tmax >= tmin && tmax >= 0.0 {
            Some(tmin.max(0.0))
        } else {
            None
        }
    }

    /// This box clipped to `outer`
    pub fn clamp_to(&self, outer: &Self) -> Self {
        Self {
            min: utils::component_max(&self.min, &outer.min),
            max: utils::component_min(&self.max, &outer.max),
        }
    }

    /// Cube of edge `max_dimension()` sharing this box's center
    pub fn cubify(&self) -> Self {
        cubify(self)
    }

    /// The eight octants of this box
    pub fn subdivide(&self, cubify: bool) -> [Self; 8] {
        subdivide(self, cubify)
    }
}

/// Expand a box to a cube around its center. The edge is the box's largest
/// dimension.
pub fn cubify(bound: &BoundingBox) -> BoundingBox {
    let half = bound.max_dimension() * 0.5;
    // Rounding can leave the cube an ulp short of the original box
    BoundingBox::from_center_extents(bound.center(), Vec3::repeat(half)).merge(bound)
}

/// Split a box at its center into eight octants
///
/// Octant layout, bit set meaning the upper half on that axis:
/// `index = (z << 2) | (y << 1) | x`. With `cubify` the box is first
/// expanded to its cube hull, so every octant at a given depth is the same
/// cube.
pub fn subdivide(bound: &BoundingBox, cubify: bool) -> [BoundingBox; 8] {
    let bound = if cubify { self::cubify(bound) } else { *bound };
    let center = bound.center();

    std::array::from_fn(|octant| {
        let (min_x, max_x) = if octant & 1 != 0 { (center.x, bound.max.x) } else { (bound.min.x, center.x) };
        let (min_y, max_y) = if octant & 2 != 0 { (center.y, bound.max.y) } else { (bound.min.y, center.y) };
        let (min_z, max_z) = if octant & 4 != 0 { (center.z, bound.max.z) } else { (bound.min.z, center.z) };
        BoundingBox::new(Vec3::new(min_x, min_y, min_z), Vec3::new(max_x, max_y, max_z))
    })
}
