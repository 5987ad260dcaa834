//! Spatial partitioning data structures
//!
//! A bounding-volume octree over member bounds, kept in step with a changing
//! member collection by [`OctreeManager`], plus the read-side
//! [`SpatialQuery`] interface for point, volume, sphere and ray queries.

mod bounds;
mod error;
mod handle;
mod manager;
mod member;
mod node;
mod octree;
mod parameters;
mod spatial_query;

#[cfg(test)]
pub(crate) mod tests;

pub use bounds::{cubify, subdivide, BoundingBox, ContainmentType};
pub use error::OctreeError;
pub use handle::OctreeHandle;
pub use manager::{BoundChangeOutcome, ManagerState, OctreeManager};
pub use member::{GeometryMember, MemberId, SceneElement};
pub use node::{NodeLocation, OctreeItem, OctreeNode};
pub use octree::Octree;
pub use parameters::OctreeBuildParameter;
pub use spatial_query::{HitTestResult, LinearScan, RayHit, SpatialQuery};
