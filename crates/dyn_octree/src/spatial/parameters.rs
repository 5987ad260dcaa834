//! Octree build parameters

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};

/// Parameters an [`Octree`](super::Octree) is built with
///
/// Loadable from TOML or RON through [`Config`]; missing keys take their
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeBuildParameter {
    /// Minimum octant edge length. A node is not subdivided once its
    /// children's longest edge would fall below this.
    pub min_octant_size: f32,

    /// Drop a node's children once its whole subtree is empty
    pub auto_delete_if_empty: bool,

    /// Force octants to be cubes instead of tight boxes
    pub cubify: bool,

    /// Record the octants visited by hit tests. Diagnostic only.
    pub record_hit_path_bounding_boxes: bool,
}

impl Default for OctreeBuildParameter {
    fn default() -> Self {
        Self {
            min_octant_size: 1.0,
            auto_delete_if_empty: true,
            cubify: false,
            record_hit_path_bounding_boxes: false,
        }
    }
}

impl Config for OctreeBuildParameter {}

impl OctreeBuildParameter {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_octant_size.is_finite() || self.min_octant_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "min_octant_size must be a positive finite number, got {}",
                self.min_octant_size
            )));
        }
        Ok(())
    }

    /// Load from a `.toml` or `.ron` file and validate
    pub fn load_validated(path: &str) -> Result<Self, ConfigError> {
        let parameter = Self::load_from_file(path)?;
        parameter.validate()?;
        Ok(parameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let parameter = OctreeBuildParameter::default();
        assert_eq!(parameter.min_octant_size, 1.0);
        assert!(parameter.auto_delete_if_empty);
        assert!(!parameter.cubify);
        assert!(!parameter.record_hit_path_bounding_boxes);
        assert!(parameter.validate().is_ok());
    }

    #[test]
    fn test_toml_partial_uses_defaults() {
        let parameter = OctreeBuildParameter::load_from_str(
            "octree.toml",
            "min_octant_size = 2.5\ncubify = true\n",
        )
        .expect("toml parse");
        assert_eq!(parameter.min_octant_size, 2.5);
        assert!(parameter.cubify);
        assert!(parameter.auto_delete_if_empty);
    }

    #[test]
    fn test_ron_round_trip() {
        let parameter = OctreeBuildParameter {
            min_octant_size: 0.25,
            auto_delete_if_empty: false,
            cubify: true,
            record_hit_path_bounding_boxes: true,
        };
        let text = parameter.to_config_string("octree.ron").expect("ron serialize");
        let parsed = OctreeBuildParameter::load_from_str("octree.ron", &text).expect("ron parse");
        assert_eq!(parsed, parameter);
    }

    #[test]
    fn test_rejects_bad_min_size() {
        for bad in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let parameter = OctreeBuildParameter { min_octant_size: bad, ..Default::default() };
            assert!(matches!(parameter.validate(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let result = OctreeBuildParameter::load_from_str("octree.json", "{}");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
