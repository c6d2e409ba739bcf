//! Harness configuration.

use std::path::Path;

use anyhow::ensure;
use quadtree::{Bounds, QuadTreeConfig};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default configuration file name.
pub const CONFIG_FILE: &str = "quadtree.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub bench: BenchConfig,
}

impl Config {
    /// Load configuration from `path`, writing the defaults there if it is missing.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            default_config
        };
        Self::validate(&config)?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        let b = self.tree.bounds;
        ensure!(
            b.width() > 0.0 && b.height() > 0.0,
            "tree bounds must have positive area, got {:?}",
            b
        );
        ensure!(self.tree.thresholds.max_elements > 0, "max_elements must be at least 1");
        Ok(())
    }
}

/// Root bounds and split thresholds shared by the harnesses.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TreeConfig {
    #[serde(flatten)]
    pub thresholds: QuadTreeConfig,
    #[serde(default = "default_bounds")]
    pub bounds: Bounds,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            thresholds: QuadTreeConfig::default(),
            bounds: default_bounds(),
        }
    }
}

/// Settings for `qt-demo`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoConfig {
    /// Number of random points scattered in the root bounds.
    #[serde(default = "default_demo_points")]
    pub points: usize,
    /// RNG seed for the scatter.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            points: default_demo_points(),
            seed: default_seed(),
        }
    }
}

/// Settings for `qt-bench`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BenchConfig {
    /// Point counts, one table row each.
    #[serde(default = "default_sizes")]
    pub sizes: Vec<usize>,
    /// Random area queries per row.
    #[serde(default = "default_queries")]
    pub queries: usize,
    /// Nearest-neighbor lookups per row.
    #[serde(default = "default_nearest_samples")]
    pub nearest_samples: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            queries: default_queries(),
            nearest_samples: default_nearest_samples(),
            seed: default_seed(),
        }
    }
}

fn default_bounds() -> Bounds {
    Bounds::new(0.0, 0.0, 1000.0, 1000.0)
}

fn default_demo_points() -> usize {
    100
}

fn default_seed() -> u64 {
    1
}

fn default_sizes() -> Vec<usize> {
    vec![1_000, 5_000, 10_000, 20_000]
}

fn default_queries() -> usize {
    500
}

fn default_nearest_samples() -> usize {
    500
}
