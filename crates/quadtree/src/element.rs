//! Stored (item, point) pairs.

use crate::Point;

/// An item stored in the quadtree at a fixed point.
///
/// Two elements are equal when both the item and the point are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct Element<T> {
    /// The caller's payload.
    pub item: T,
    /// Location of the item.
    pub point: Point,
}

impl<T> Element<T> {
    #[inline]
    pub fn new(item: T, point: Point) -> Self {
        Self { item, point }
    }

    /// Whether this element is the pair `(item, point)`.
    #[inline]
    pub(crate) fn matches(&self, item: &T, point: Point) -> bool
    where
        T: PartialEq,
    {
        self.point == point && self.item == *item
    }
}
