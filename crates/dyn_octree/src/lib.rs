//! # Dynamic Octree
//!
//! A bounding-volume octree that stays in step with a changing set of scene
//! members, patching itself locally when a member moves and falling back to a
//! full rebuild only when a member escapes the root octant.
//!
//! ## Features
//!
//! - **Incremental relocation**: bound changes are applied in place when possible
//! - **Safe publication**: readers see a complete tree or none at all
//! - **Lazy members**: members without a bound yet are inserted once measured
//! - **Queries**: point, volume, sphere and ray hit tests, with a linear fallback
//! - **Configuration**: build parameters from TOML or RON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dyn_octree::prelude::*;
//!
//! struct Body {
//!     id: MemberId,
//!     bound: BoundingBox,
//! }
//!
//! impl GeometryMember for Body {
//!     fn id(&self) -> MemberId {
//!         self.id
//!     }
//!
//!     fn bounds(&self) -> BoundingBox {
//!         self.bound
//!     }
//! }
//!
//! impl SceneElement for Body {
//!     fn as_geometry(&self) -> Option<&dyn GeometryMember> {
//!         Some(self)
//!     }
//! }
//!
//! fn main() -> Result<(), OctreeError> {
//!     let mut ids: slotmap::SlotMap<MemberId, ()> = slotmap::SlotMap::with_key();
//!     let bodies = vec![
//!         Body { id: ids.insert(()), bound: BoundingBox::new(Vec3::zeros(), Vec3::repeat(1.0)) },
//!         Body { id: ids.insert(()), bound: BoundingBox::new(Vec3::repeat(8.0), Vec3::repeat(9.0)) },
//!     ];
//!
//!     let mut manager = OctreeManager::new();
//!     manager.rebuild_tree(&bodies)?;
//!
//!     if let Some(tree) = manager.octree() {
//!         let hits = tree.query_point(&Vec3::repeat(0.5));
//!         assert_eq!(hits, vec![bodies[0].id]);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod events;
pub mod foundation;
pub mod spatial;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        events::{BoundEvent, NotificationQueue, Subscription},
        foundation::math::Vec3,
        spatial::{
            BoundChangeOutcome, BoundingBox, GeometryMember, LinearScan, ManagerState, MemberId,
            Octree, OctreeBuildParameter, OctreeError, OctreeHandle, OctreeManager, SceneElement,
            SpatialQuery,
        },
    };
}
