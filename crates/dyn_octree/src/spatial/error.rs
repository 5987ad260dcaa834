//! Errors reported by the octree manager
//!
//! None of these are fatal. The tree algorithms themselves answer with
//! `bool`; the manager turns the interesting failures into these variants so
//! hosts can log or count them.

use thiserror::Error;

use super::member::MemberId;
use crate::config::ConfigError;

/// Octree manager errors
#[derive(Error, Debug)]
pub enum OctreeError {
    /// The member's bound falls outside the root octant; a rebuild is owed
    #[error("member {id:?} lies outside the root octant")]
    OutsideRoot {
        /// Offending member
        id: MemberId,
    },

    /// The member was not found where its bound says it should be
    #[error("member {id:?} not found in the octree")]
    MemberNotFound {
        /// Missing member
        id: MemberId,
    },

    /// Nothing indexable was handed to a build
    #[error("octree build produced no tree (no members with valid bounds)")]
    EmptyBuild,

    /// The manager is disabled
    #[error("octree manager is disabled")]
    Disabled,

    /// Configuration could not be loaded or is out of range
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
