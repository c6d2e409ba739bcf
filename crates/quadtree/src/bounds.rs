//! Axis-aligned bounding boxes and the quadrant routing rules built on them.

use serde::{Deserialize, Serialize};

use crate::Point;

/// Axis-aligned bounding box.
///
/// No validation is performed: callers must keep `min <= max` on both axes
/// and use finite coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Create bounds from center and half extent.
    #[inline]
    pub fn from_center(cx: f64, cy: f64, half_extent: f64) -> Self {
        Self {
            min_x: cx - half_extent,
            min_y: cy - half_extent,
            max_x: cx + half_extent,
            max_y: cy + half_extent,
        }
    }

    /// Get the width of the bounds.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Get the height of the bounds.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Get center X.
    #[inline]
    pub fn mid_x(&self) -> f64 {
        (self.min_x + self.max_x) / 2.0
    }

    /// Get center Y.
    #[inline]
    pub fn mid_y(&self) -> f64 {
        (self.min_y + self.max_y) / 2.0
    }

    /// Whether the box is inverted on either axis.
    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    /// Index of the quadrant a point is routed to: `2 * (x > mid_x) + (y > mid_y)`.
    ///
    /// Routing never looks at the box extents, so points outside the box land
    /// in the extremal quadrant on each axis.
    #[inline]
    pub fn quadrant_index(&self, point: Point) -> usize {
        2 * usize::from(point.x > self.mid_x()) + usize::from(point.y > self.mid_y())
    }

    /// Box of quadrant `index` (0..4), ordered as [`Bounds::quadrant_index`] routes.
    pub fn quadrant(&self, index: usize) -> Self {
        let mid_x = self.mid_x();
        let mid_y = self.mid_y();
        let (min_x, max_x) = if index & 2 == 0 {
            (self.min_x, mid_x)
        } else {
            (mid_x, self.max_x)
        };
        let (min_y, max_y) = if index & 1 == 0 {
            (self.min_y, mid_y)
        } else {
            (mid_y, self.max_y)
        };
        Self { min_x, min_y, max_x, max_y }
    }

    /// All four quadrant boxes in routing order.
    pub fn quadrants(&self) -> [Self; 4] {
        [0, 1, 2, 3].map(|index| self.quadrant(index))
    }

    /// Half-open containment: min edges are inside, max edges are outside.
    #[inline]
    pub fn contains_half_open(&self, point: Point) -> bool {
        self.min_x <= point.x && point.x < self.max_x && self.min_y <= point.y && point.y < self.max_y
    }

    /// Squared distance from `point` to the nearest point of the box, 0 when inside.
    #[inline]
    pub fn distance_sq_to_point(&self, point: Point) -> f64 {
        let dx = axis_clearance(point.x, self.min_x, self.max_x);
        let dy = axis_clearance(point.y, self.min_y, self.max_y);
        dx * dx + dy * dy
    }

    /// This box with every edge it shares with `outer` pushed out to infinity.
    ///
    /// Points beyond the root edges are stored in the nodes along those edges,
    /// so this is the region a node's elements can actually occupy.
    pub fn open_toward(&self, outer: &Self) -> Self {
        let open_min = |v: f64, edge: f64| if v <= edge { f64::NEG_INFINITY } else { v };
        let open_max = |v: f64, edge: f64| if v >= edge { f64::INFINITY } else { v };
        Self {
            min_x: open_min(self.min_x, outer.min_x),
            min_y: open_min(self.min_y, outer.min_y),
            max_x: open_max(self.max_x, outer.max_x),
            max_y: open_max(self.max_y, outer.max_y),
        }
    }
}

#[inline]
fn axis_clearance(v: f64, min: f64, max: f64) -> f64 {
    if v < min {
        min - v
    } else if v > max {
        v - max
    } else {
        0.0
    }
}

impl From<(f64, f64, f64, f64)> for Bounds {
    fn from((min_x, min_y, max_x, max_y): (f64, f64, f64, f64)) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }
}

impl From<[f64; 4]> for Bounds {
    fn from([min_x, min_y, max_x, max_y]: [f64; 4]) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }
}
