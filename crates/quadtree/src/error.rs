//! Quadtree error types.

use thiserror::Error;

/// Errors surfaced by [`QuadTree`](crate::QuadTree) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuadTreeError {
    #[error("Item not found in the quadtree")]
    NotFound,
}

pub type Result<T, E = QuadTreeError> = std::result::Result<T, E>;
