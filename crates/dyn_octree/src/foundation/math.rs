//! Math utilities and types
//!
//! Provides the vector types the octree works in.

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Math utility functions
pub mod utils {
    use super::Vec3;

    /// Component-wise minimum of two vectors
    pub fn component_min(a: &Vec3, b: &Vec3) -> Vec3 {
        a.inf(b)
    }

    /// Component-wise maximum of two vectors
    pub fn component_max(a: &Vec3, b: &Vec3) -> Vec3 {
        a.sup(b)
    }

    /// True when every component is finite
    pub fn is_finite(v: &Vec3) -> bool {
        v.iter().all(|c| c.is_finite())
    }

    /// Largest of the three components
    pub fn max_component(v: &Vec3) -> f32 {
        v.x.max(v.y).max(v.z)
    }
}
