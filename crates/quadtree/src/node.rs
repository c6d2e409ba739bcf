//! Quadrant nodes: leaves holding elements, internal nodes holding four children.
//!
//! A node splits when its element list outgrows `max_elements` (unless it sits
//! at `max_depth`) and merges its children back when a delete leaves their
//! combined count at or below `max_elements`.

use tracing::trace;

use crate::{Bounds, Element, Point, QuadTreeConfig};

/// Contents of a node. A leaf never holds children, an internal node never
/// holds elements directly.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind<T> {
    Leaf(Vec<Element<T>>),
    /// Children ordered by [`Bounds::quadrant_index`].
    Internal(Box<[Node<T>; 4]>),
}

/// A quadrant of space owned by a [`QuadTree`](crate::QuadTree).
#[derive(Debug, Clone)]
pub struct Node<T> {
    bounds: Bounds,
    depth: usize,
    config: QuadTreeConfig,
    pub(crate) kind: NodeKind<T>,
}

impl<T> Node<T> {
    /// Create an empty root leaf.
    pub(crate) fn new(bounds: Bounds, config: QuadTreeConfig) -> Self {
        Self::with_depth(bounds, 0, config)
    }

    fn with_depth(bounds: Bounds, depth: usize, config: QuadTreeConfig) -> Self {
        Self {
            bounds,
            depth,
            config,
            kind: NodeKind::Leaf(Vec::new()),
        }
    }

    /// Box covered by this node.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Depth of this node, the root is 0.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }

    /// Elements held directly by this node. Always empty for internal nodes.
    pub fn elements(&self) -> &[Element<T>] {
        match &self.kind {
            NodeKind::Leaf(elements) => elements,
            NodeKind::Internal(_) => &[],
        }
    }

    /// The four children of an internal node, `None` for leaves.
    pub fn children(&self) -> Option<&[Node<T>; 4]> {
        match &self.kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Internal(children) => Some(children),
        }
    }

    /// Number of elements in this subtree.
    pub fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(elements) => elements.len(),
            NodeKind::Internal(children) => children.iter().map(Node::len).sum(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(_) => 1,
            NodeKind::Internal(children) => 1 + children.iter().map(Node::node_count).sum::<usize>(),
        }
    }

    /// Deepest node depth in this subtree.
    pub fn max_depth_reached(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf(_) => self.depth,
            NodeKind::Internal(children) => children
                .iter()
                .map(Node::max_depth_reached)
                .max()
                .unwrap_or(self.depth),
        }
    }

    /// Insert an element, splitting this leaf if it overflows.
    pub(crate) fn insert(&mut self, element: Element<T>) {
        let overflow = match &mut self.kind {
            NodeKind::Leaf(elements) => {
                elements.push(element);
                elements.len() > self.config.max_elements && self.depth < self.config.max_depth
            }
            NodeKind::Internal(children) => {
                let index = self.bounds.quadrant_index(element.point);
                children[index].insert(element);
                false
            }
        };

        if overflow {
            self.split();
        }
    }

    /// Remove the first element equal to `(item, point)`.
    ///
    /// Returns the removed element, or `None` if this subtree does not hold it.
    /// Internal nodes collapse back into a leaf once every child is a leaf and
    /// the children together hold at most `max_elements`.
    pub(crate) fn remove(&mut self, item: &T, point: Point) -> Option<Element<T>>
    where
        T: PartialEq,
    {
        let removed = match &mut self.kind {
            NodeKind::Leaf(elements) => {
                let position = elements.iter().position(|e| e.matches(item, point))?;
                return Some(elements.remove(position));
            }
            NodeKind::Internal(children) => {
                let index = self.bounds.quadrant_index(point);
                children[index].remove(item, point)?
            }
        };

        if self.can_merge() {
            self.merge();
        }

        Some(removed)
    }

    /// Whether all children are leaves holding at most `max_elements` together.
    fn can_merge(&self) -> bool {
        let NodeKind::Internal(children) = &self.kind else {
            return false;
        };

        let mut count = 0;
        for child in children.iter() {
            match &child.kind {
                NodeKind::Leaf(elements) => count += elements.len(),
                // Merging only lifts direct children's elements, so a grandchild blocks it.
                NodeKind::Internal(_) => return false,
            }
        }
        count <= self.config.max_elements
    }

    /// Turn this leaf into an internal node and route its elements into the
    /// four new children.
    fn split(&mut self) {
        let NodeKind::Leaf(elements) = &mut self.kind else {
            return;
        };
        let elements = std::mem::take(elements);

        trace!(
            "Splitting node at depth {} {:?} ({} elements)",
            self.depth,
            self.bounds,
            elements.len()
        );

        let depth = self.depth + 1;
        let config = self.config;
        let mut children = Box::new(
            self.bounds
                .quadrants()
                .map(|bounds| Self::with_depth(bounds, depth, config)),
        );

        for element in elements {
            let index = self.bounds.quadrant_index(element.point);
            children[index].insert(element);
        }

        self.kind = NodeKind::Internal(children);
    }

    /// Collapse an internal node whose children are all leaves back into a leaf.
    fn merge(&mut self) {
        let NodeKind::Internal(children) = &mut self.kind else {
            return;
        };

        let mut elements = Vec::new();
        for child in children.iter_mut() {
            if let NodeKind::Leaf(child_elements) = &mut child.kind {
                elements.append(child_elements);
            }
        }

        trace!(
            "Merging node at depth {} {:?} ({} elements)",
            self.depth,
            self.bounds,
            elements.len()
        );

        self.kind = NodeKind::Leaf(elements);
    }

    /// Push the box of this node and every descendant, parent before children,
    /// children in quadrant order.
    pub(crate) fn collect_bounds(&self, out: &mut Vec<Bounds>) {
        out.push(self.bounds);
        if let NodeKind::Internal(children) = &self.kind {
            for child in children.iter() {
                child.collect_bounds(out);
            }
        }
    }
}
