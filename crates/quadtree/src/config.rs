//! Subdivision thresholds.

use serde::{Deserialize, Serialize};

/// Thresholds controlling when leaves split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuadTreeConfig {
    /// Elements a leaf holds before it splits.
    #[serde(default = "default_max_elements")]
    pub max_elements: usize,
    /// Depth at which leaves stop splitting and tolerate overflow.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl QuadTreeConfig {
    pub const fn new(max_elements: usize, max_depth: usize) -> Self {
        Self { max_elements, max_depth }
    }
}

impl Default for QuadTreeConfig {
    fn default() -> Self {
        Self {
            max_elements: default_max_elements(),
            max_depth: default_max_depth(),
        }
    }
}

fn default_max_elements() -> usize {
    10
}

fn default_max_depth() -> usize {
    10
}
