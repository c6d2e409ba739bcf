//! Mutable 2D point quadtree.
//!
//! This crate contains:
//! - [`QuadTree`]: add/delete/relocate items by key, range queries and
//!   branch-and-bound nearest-neighbor search
//! - [`Node`]: the adaptive subdivision (split on overflow, merge on underflow)
//! - Shared types ([`Bounds`], [`Element`], [`Point`])
//!
//! ```
//! use quadtree::{Point, QuadTree};
//!
//! let mut tree = QuadTree::new((0.0, 0.0, 1000.0, 500.0), 10, 5);
//! tree.add("apple", Point::new(100.0, 100.0));
//! tree.add("orange", Point::new(200.0, 50.0));
//!
//! let found = tree.query((50.0, 50.0, 150.0, 150.0));
//! assert_eq!(found[0].item, "apple");
//!
//! let nearest = tree.nearest_neighbor(Point::new(200.0, 100.0)).unwrap();
//! assert_eq!(nearest.item, "orange");
//! ```

mod bounds;
mod config;
mod element;
mod error;
mod node;
mod quadtree;

pub use bounds::Bounds;
pub use config::QuadTreeConfig;
pub use element::Element;
pub use error::{QuadTreeError, Result};
pub use node::Node;
pub use quadtree::QuadTree;

/// Represents a 2D point using glam's DVec2.
pub type Point = glam::DVec2;
