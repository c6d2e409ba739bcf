//! The public spatial index.
//!
//! [`QuadTree`] owns the root [`Node`] plus an item → point map, so deleting
//! or relocating an item finds its element without scanning the tree.

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::node::NodeKind;
use crate::{Bounds, Element, Node, Point, QuadTreeConfig, QuadTreeError, Result};

/// Mutable point quadtree keyed by item.
///
/// Items must be unique: each item maps to exactly one point at a time.
/// Not safe for concurrent use; wrap it in a lock if it must be shared.
#[derive(Clone)]
pub struct QuadTree<T> {
    root: Node<T>,
    /// Current point of every indexed item.
    items: HashMap<T, Point>,
    config: QuadTreeConfig,
}

impl<T> QuadTree<T>
where
    T: Clone + Eq + Hash,
{
    /// Create an empty quadtree over `bounds`.
    ///
    /// `max_elements` is the number of elements a node holds before splitting,
    /// `max_depth` caps how many levels the tree may grow.
    pub fn new(bounds: impl Into<Bounds>, max_elements: usize, max_depth: usize) -> Self {
        Self::with_config(bounds, QuadTreeConfig::new(max_elements, max_depth))
    }

    /// Create an empty quadtree over `bounds` with explicit thresholds.
    pub fn with_config(bounds: impl Into<Bounds>, config: QuadTreeConfig) -> Self {
        let bounds = bounds.into();
        debug_assert!(!bounds.is_inverted(), "inverted root bounds: {bounds:?}");

        Self {
            root: Node::new(bounds, config),
            items: HashMap::new(),
            config,
        }
    }

    /// Root bounds, fixed at construction.
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.root.bounds()
    }

    #[inline]
    pub fn config(&self) -> QuadTreeConfig {
        self.config
    }

    /// The root node, for walking the structure.
    #[inline]
    pub fn root(&self) -> &Node<T> {
        &self.root
    }

    /// Number of indexed items.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current point of `item`.
    #[inline]
    pub fn get(&self, item: &T) -> Option<Point> {
        self.items.get(item).copied()
    }

    #[inline]
    pub fn contains(&self, item: &T) -> bool {
        self.items.contains_key(item)
    }

    /// Store `item` at `point`.
    ///
    /// If `item` is already indexed its old element is removed first, and the
    /// previous point is returned.
    ///
    /// Points outside the root bounds are accepted: routing keeps sending them
    /// into the outermost quadrant, a query box that covers them still finds
    /// them, and nearest-neighbor search still considers them.
    pub fn add(&mut self, item: T, point: Point) -> Option<Point> {
        let previous = self.items.insert(item.clone(), point);
        if let Some(old) = previous {
            debug!("Re-adding item already indexed at {}, moving it to {}", old, point);
            self.root.remove(&item, old);
        }

        self.root.insert(Element::new(item, point));
        previous
    }

    /// Remove `item`, returning the point it was stored at.
    pub fn delete(&mut self, item: &T) -> Result<Point> {
        let Some(point) = self.items.remove(item) else {
            debug!("Delete of unknown item ({} indexed)", self.items.len());
            return Err(QuadTreeError::NotFound);
        };

        self.root.remove(item, point);
        Ok(point)
    }

    /// Move an indexed item to `point`, returning its previous point.
    pub fn relocate(&mut self, item: &T, point: Point) -> Result<Point> {
        let Some(slot) = self.items.get_mut(item) else {
            return Err(QuadTreeError::NotFound);
        };
        let old = std::mem::replace(slot, point);

        let item = match self.root.remove(item, old) {
            Some(element) => element.item,
            None => {
                debug_assert!(false, "item indexed at {old} but missing from the tree");
                debug!("Relocated item was missing from the tree at {}, reinserting", old);
                item.clone()
            }
        };
        self.root.insert(Element::new(item, point));
        Ok(old)
    }

    /// Remove every item. The root becomes an empty leaf.
    pub fn clear(&mut self) {
        self.items.clear();
        self.root = Node::new(self.root.bounds(), self.config);
    }

    /// All elements whose point lies in `bounds`.
    ///
    /// The test is half-open: points on the min edges match, points on the
    /// max edges do not. Result order is unspecified.
    pub fn query(&self, bounds: impl Into<Bounds>) -> Vec<&Element<T>> {
        let bounds = bounds.into();
        let mut found = Vec::new();
        let mut stack = vec![&self.root];

        while let Some(node) = stack.pop() {
            match &node.kind {
                NodeKind::Internal(children) => {
                    let node_bounds = node.bounds();
                    let mid_x = node_bounds.mid_x();
                    let mid_y = node_bounds.mid_y();

                    // Points on a midline route to the low child, so a box whose
                    // min edge sits on the midline still needs it.
                    let low_y = bounds.min_y <= mid_y;
                    let high_y = bounds.max_y > mid_y;

                    if bounds.min_x <= mid_x {
                        if low_y {
                            stack.push(&children[0]);
                        }
                        if high_y {
                            stack.push(&children[1]);
                        }
                    }
                    if bounds.max_x > mid_x {
                        if low_y {
                            stack.push(&children[2]);
                        }
                        if high_y {
                            stack.push(&children[3]);
                        }
                    }
                }
                NodeKind::Leaf(elements) => {
                    found.extend(elements.iter().filter(|e| bounds.contains_half_open(e.point)));
                }
            }
        }

        found
    }

    /// The element nearest to `point`, if any.
    pub fn nearest_neighbor(&self, point: Point) -> Option<&Element<T>> {
        self.nearest_neighbors(point, 1).into_iter().next()
    }

    /// Up to `k` elements nearest to `point`, nearest first.
    pub fn nearest_neighbors(&self, point: Point, k: usize) -> Vec<&Element<T>> {
        self.nearest_neighbors_where(point, k, f64::INFINITY, |_| true)
    }

    /// Up to `k` elements nearest to `point`, nearest first, restricted to items
    /// accepted by `condition` and strictly closer than `max_distance`.
    ///
    /// Runs one branch-and-bound search per neighbor; each search skips the
    /// elements found by the previous ones. Stops early once a search comes
    /// back empty.
    pub fn nearest_neighbors_where<F>(
        &self,
        point: Point,
        k: usize,
        max_distance: f64,
        mut condition: F,
    ) -> Vec<&Element<T>>
    where
        F: FnMut(&T) -> bool,
    {
        let max_distance_sq = max_distance * max_distance;
        let mut found: Vec<&Element<T>> = Vec::with_capacity(k.min(self.len()));

        while found.len() < k {
            match self.nearest_excluding(point, max_distance_sq, &mut condition, &found) {
                Some(element) => found.push(element),
                None => break,
            }
        }

        found
    }

    /// One branch-and-bound round.
    ///
    /// Each frontier entry carries the node's squared box distance so it is
    /// computed once per node. Node boxes are opened along the root edges so
    /// elements stored outside the root bounds are never pruned away.
    fn nearest_excluding<'a, F>(
        &'a self,
        point: Point,
        max_distance_sq: f64,
        condition: &mut F,
        exclude: &[&'a Element<T>],
    ) -> Option<&'a Element<T>>
    where
        F: FnMut(&T) -> bool,
    {
        let mut best: Option<&Element<T>> = None;
        let mut best_sq = max_distance_sq;
        let root_bounds = self.root.bounds();
        let lower_bound = |node: &Node<T>| node.bounds().open_toward(&root_bounds).distance_sq_to_point(point);
        let mut stack = vec![(&self.root, lower_bound(&self.root))];

        while let Some((node, box_sq)) = stack.pop() {
            if box_sq > best_sq {
                continue;
            }

            match &node.kind {
                NodeKind::Internal(children) => {
                    let mut ranked = children.each_ref().map(|child| (child, lower_bound(child)));
                    // Farthest first, so the nearest child is popped next.
                    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

                    for (child, child_sq) in ranked {
                        if child_sq < best_sq {
                            stack.push((child, child_sq));
                        }
                    }
                }
                NodeKind::Leaf(elements) => {
                    for element in elements {
                        let distance_sq = point.distance_squared(element.point);
                        if distance_sq < best_sq && condition(&element.item) && !exclude.contains(&element) {
                            best_sq = distance_sq;
                            best = Some(element);
                        }
                    }
                }
            }
        }

        best
    }

    /// Boxes of every node, parent before children.
    pub fn get_all_bbox(&self) -> Vec<Bounds> {
        let mut all = Vec::new();
        self.root.collect_bounds(&mut all);
        all
    }

    /// Every indexed `(item, point)` pair, in no particular order.
    pub fn get_all_elements(&self) -> Vec<Element<T>> {
        self.iter()
            .map(|(item, point)| Element::new(item.clone(), point))
            .collect()
    }

    /// Iterate over indexed items and their points.
    pub fn iter(&self) -> impl Iterator<Item = (&T, Point)> + '_ {
        self.items.iter().map(|(item, point)| (item, *point))
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Deepest level the tree has grown to.
    pub fn max_depth_reached(&self) -> usize {
        self.root.max_depth_reached()
    }
}

impl<T> Extend<(T, Point)> for QuadTree<T>
where
    T: Clone + Eq + Hash,
{
    fn extend<I: IntoIterator<Item = (T, Point)>>(&mut self, iter: I) {
        for (item, point) in iter {
            self.add(item, point);
        }
    }
}

impl<T> std::fmt::Debug for QuadTree<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuadTree")
            .field("items", &self.items.len())
            .field("bounds", &self.root.bounds())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn world() -> QuadTree<u32> {
        QuadTree::new((-500.0, -500.0, 500.0, 500.0), 3, 10)
    }

    fn random_points(seed: u64, count: u32) -> Vec<(u32, Point)> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|i| {
                let x = rng.random_range(-500..=500) as f64;
                let y = rng.random_range(-500..=500) as f64;
                (i, Point::new(x, y))
            })
            .collect()
    }

    fn sorted_items<'a>(elements: impl IntoIterator<Item = &'a Element<u32>>) -> Vec<u32> {
        let mut items: Vec<u32> = elements.into_iter().map(|e| e.item).collect();
        items.sort_unstable();
        items
    }

    #[test]
    fn test_add_then_query_center() {
        let mut tree = world();
        tree.add(1, Point::new(0.0, 0.0));

        let found = tree.query((-1.0, -1.0, 1.0, 1.0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item, 1);
    }

    #[test]
    fn test_add_then_query_corners() {
        for (x, y) in [(-500.0, 500.0), (500.0, -500.0), (-500.0, -500.0), (500.0, 500.0)] {
            let mut tree = world();
            tree.add(1, Point::new(x, y));

            let found = tree.query(Bounds::from_center(x, y, 1.0));
            assert_eq!(sorted_items(found), vec![1], "corner ({x}, {y})");
        }
    }

    #[test]
    fn test_query_excludes_max_edges() {
        let mut tree = world();
        tree.add(1, Point::new(500.0, 500.0));

        assert_eq!(tree.query((499.0, 499.0, 501.0, 501.0)).len(), 1);
        // Min edges are inclusive, max edges exclusive.
        assert_eq!(tree.query((500.0, 500.0, 501.0, 501.0)).len(), 1);
        assert!(tree.query((499.0, 499.0, 500.0, 500.0)).is_empty());
    }

    #[test]
    fn test_query_misses_far_boxes() {
        let mut tree = world();
        tree.add(1, Point::new(500.0, 500.0));

        assert!(tree.query((501.0, 501.0, 502.0, 502.0)).is_empty());
        assert!(tree.query((-502.0, -502.0, -501.0, -501.0)).is_empty());
    }

    #[test]
    fn test_query_min_edge_on_midline() {
        let mut tree = QuadTree::new((-500.0, -500.0, 500.0, 500.0), 1, 10);
        tree.add(1, Point::new(0.0, 0.0));
        tree.add(2, Point::new(100.0, 100.0));
        tree.add(3, Point::new(-100.0, -100.0));
        assert!(!tree.root().is_leaf());

        // (0, 0) lives in quadrant 0, below the box's min edges.
        assert_eq!(sorted_items(tree.query((0.0, 0.0, 1.0, 1.0))), vec![1]);
        assert_eq!(sorted_items(tree.query((0.0, 0.0, 200.0, 200.0))), vec![1, 2]);
    }

    #[test]
    fn test_out_of_bounds_point_is_stored() {
        let mut tree = world();
        tree.add(1, Point::new(600.0, 600.0));

        let found = tree.query((599.0, 599.0, 601.0, 601.0));
        assert_eq!(sorted_items(found), vec![1]);
    }

    #[test]
    fn test_many_points_each_found() {
        for seed in [1, 2] {
            let mut tree = world();
            let points = random_points(seed, 1000);
            tree.extend(points.iter().copied());

            for (item, point) in &points {
                let found = tree.query(Bounds::from_center(point.x, point.y, 1.0));
                assert!(
                    found.iter().any(|e| e.item == *item),
                    "item {item} at {point} lost (seed {seed})"
                );
            }
        }
    }

    #[test]
    fn test_query_matches_brute_force() {
        for seed in [1, 2, 3] {
            let mut tree = world();
            let points = random_points(seed, 5000);
            tree.extend(points.iter().copied());

            let area = Bounds::new(-30.0, -30.0, 30.0, 30.0);
            let expected: Vec<u32> = {
                let mut v: Vec<u32> = points
                    .iter()
                    .filter(|(_, p)| -30.0 <= p.x && p.x < 30.0 && -30.0 <= p.y && p.y < 30.0)
                    .map(|(i, _)| *i)
                    .collect();
                v.sort_unstable();
                v
            };

            assert_eq!(sorted_items(tree.query(area)), expected, "seed {seed}");
        }
    }

    #[test]
    fn test_query_root_returns_everything_inside() {
        let mut tree = world();
        let points = random_points(7, 2000);
        tree.extend(points.iter().copied());

        let expected: Vec<u32> = {
            let mut v: Vec<u32> = points
                .iter()
                .filter(|(_, p)| p.x < 500.0 && p.y < 500.0)
                .map(|(i, _)| *i)
                .collect();
            v.sort_unstable();
            v
        };
        assert_eq!(sorted_items(tree.query(tree.bounds())), expected);
    }

    #[test]
    fn test_delete_removes_item() {
        let mut tree = world();
        tree.add(1, Point::new(10.0, 10.0));
        tree.add(2, Point::new(10.0, 10.0));

        assert_eq!(tree.delete(&1), Ok(Point::new(10.0, 10.0)));
        assert!(!tree.contains(&1));
        assert_eq!(sorted_items(tree.query((9.0, 9.0, 11.0, 11.0))), vec![2]);
    }

    #[test]
    fn test_delete_unknown_item() {
        let mut tree = world();
        tree.add(1, Point::new(10.0, 10.0));

        assert_eq!(tree.delete(&2), Err(QuadTreeError::NotFound));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().len(), 1);

        tree.delete(&1).unwrap();
        assert_eq!(tree.delete(&1), Err(QuadTreeError::NotFound));
        assert!(tree.root().is_empty());
    }

    #[test]
    fn test_readd_moves_item() {
        let mut tree = world();
        assert_eq!(tree.add(1, Point::new(10.0, 10.0)), None);
        assert_eq!(tree.add(1, Point::new(-10.0, -10.0)), Some(Point::new(10.0, 10.0)));

        assert_eq!(tree.root().len(), 1);
        assert!(tree.query((9.0, 9.0, 11.0, 11.0)).is_empty());
        assert_eq!(sorted_items(tree.query((-11.0, -11.0, -9.0, -9.0))), vec![1]);
    }

    #[test]
    fn test_relocate() {
        let mut tree = world();
        tree.add(1, Point::new(10.0, 10.0));

        assert_eq!(tree.relocate(&1, Point::new(200.0, 200.0)), Ok(Point::new(10.0, 10.0)));
        assert_eq!(tree.get(&1), Some(Point::new(200.0, 200.0)));
        assert!(tree.query((9.0, 9.0, 11.0, 11.0)).is_empty());
        assert_eq!(sorted_items(tree.query((199.0, 199.0, 201.0, 201.0))), vec![1]);

        assert_eq!(tree.relocate(&2, Point::ZERO), Err(QuadTreeError::NotFound));
    }

    #[test]
    fn test_clear() {
        let mut tree = world();
        tree.extend(random_points(3, 100));
        assert!(tree.node_count() > 1);

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.get_all_bbox(), vec![tree.bounds()]);
    }

    #[test]
    fn test_structure_converges_after_churn() {
        let points = random_points(11, 300);
        let (keep, churn) = points.split_at(200);

        let mut direct = world();
        direct.extend(keep.iter().copied());

        let mut churned = world();
        for (i, (item, point)) in points.iter().enumerate() {
            churned.add(*item, *point);
            // Interleave deletes so splits and merges alternate along the way.
            if i % 3 == 2 {
                if let Some((old, _)) = churn.iter().find(|(c, _)| churned.contains(c)) {
                    churned.delete(old).unwrap();
                }
            }
        }
        for (item, _) in churn {
            let _ = churned.delete(item);
        }

        assert_eq!(churned.len(), direct.len());
        assert_eq!(churned.get_all_bbox(), direct.get_all_bbox());
    }

    #[test]
    fn test_nearest_neighbor_fruit() {
        let mut tree: QuadTree<&str> = QuadTree::new((0.0, 0.0, 1000.0, 500.0), 10, 5);
        tree.add("apple", Point::new(100.0, 100.0));
        tree.add("orange", Point::new(200.0, 50.0));

        let nearest = tree.nearest_neighbors(Point::new(200.0, 100.0), 1);
        assert_eq!(nearest.len(), 1);
        assert_eq!(nearest[0], &Element::new("orange", Point::new(200.0, 50.0)));

        let found = tree.query((50.0, 50.0, 150.0, 150.0));
        assert_eq!(found, vec![&Element::new("apple", Point::new(100.0, 100.0))]);
    }

    #[test]
    fn test_nearest_neighbor_matches_brute_force() {
        let mut tree = world();
        let points = random_points(5, 2000);
        tree.extend(points.iter().copied());

        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let target = Point::new(rng.random_range(-600.0..600.0), rng.random_range(-600.0..600.0));
            let best = tree.nearest_neighbor(target).unwrap();
            let best_sq = target.distance_squared(best.point);

            for (_, p) in &points {
                assert!(best_sq <= target.distance_squared(*p));
            }
        }
    }

    #[test]
    fn test_nearest_neighbors_k_ordered_and_distinct() {
        let mut tree = world();
        let points = random_points(8, 1000);
        tree.extend(points.iter().copied());

        let target = Point::new(12.0, -40.0);
        let found = tree.nearest_neighbors(target, 10);
        assert_eq!(found.len(), 10);

        let distances: Vec<f64> = found.iter().map(|e| target.distance_squared(e.point)).collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));

        let mut brute: Vec<f64> = points.iter().map(|(_, p)| target.distance_squared(*p)).collect();
        brute.sort_by(f64::total_cmp);
        assert_eq!(distances, brute[..10]);

        let items = sorted_items(found.iter().copied());
        let mut deduped = items.clone();
        deduped.dedup();
        assert_eq!(items, deduped);
    }

    #[test]
    fn test_nearest_neighbors_condition_and_max_distance() {
        let mut tree = world();
        tree.add(1, Point::new(0.0, 0.0));
        tree.add(2, Point::new(3.0, 4.0));
        tree.add(3, Point::new(30.0, 40.0));

        let odd = tree.nearest_neighbors_where(Point::ZERO, 3, f64::INFINITY, |item| item % 2 == 1);
        assert_eq!(sorted_items(odd.iter().copied()), vec![1, 3]);
        assert_eq!(odd[0].item, 1);

        // Strictly closer than max_distance.
        let near = tree.nearest_neighbors_where(Point::ZERO, 3, 5.0, |_| true);
        assert_eq!(sorted_items(near.iter().copied()), vec![1]);

        let near = tree.nearest_neighbors_where(Point::ZERO, 3, 5.1, |_| true);
        assert_eq!(sorted_items(near.iter().copied()), vec![1, 2]);

        assert!(tree.nearest_neighbors(Point::ZERO, 0).is_empty());
    }

    #[test]
    fn test_nearest_neighbor_with_out_of_bounds_points() {
        for seed in 0..50 {
            let mut tree = QuadTree::new((0.0, 0.0, 100.0, 100.0), 2, 8);
            let mut rng = StdRng::seed_from_u64(seed);
            let points: Vec<(u32, Point)> = (0..40)
                .map(|i| (i, Point::new(rng.random_range(-100.0..200.0), rng.random_range(-100.0..200.0))))
                .collect();
            tree.extend(points.iter().copied());

            for _ in 0..20 {
                let target = Point::new(rng.random_range(-150.0..250.0), rng.random_range(-150.0..250.0));
                let best = tree.nearest_neighbor(target).unwrap();
                let best_sq = target.distance_squared(best.point);
                let brute = points
                    .iter()
                    .map(|(_, p)| target.distance_squared(*p))
                    .fold(f64::INFINITY, f64::min);
                assert_eq!(best_sq, brute, "seed {seed}, target {target}");
            }
        }
    }

    #[test]
    fn test_nearest_neighbors_coincident_items() {
        let mut tree = world();
        for item in 0..5 {
            tree.add(item, Point::new(10.0, 10.0));
        }
        tree.add(5, Point::new(400.0, -400.0));

        let found = tree.nearest_neighbors(Point::new(12.0, 12.0), 6);
        assert_eq!(found.len(), 6);
        assert_eq!(sorted_items(found[..5].iter().copied()), vec![0, 1, 2, 3, 4]);
        assert!(found[..5].iter().all(|e| e.point == Point::new(10.0, 10.0)));
        assert_eq!(found[5].item, 5);
    }

    #[test]
    fn test_nearest_on_empty_tree() {
        let tree = world();
        assert!(tree.nearest_neighbor(Point::ZERO).is_none());
        assert!(tree.nearest_neighbors(Point::ZERO, 5).is_empty());
    }

    #[test]
    fn test_get_all_elements_and_bbox() {
        let mut tree = world();
        tree.add(1, Point::new(-100.0, -100.0));
        tree.add(2, Point::new(100.0, 100.0));

        let mut all = tree.get_all_elements();
        all.sort_by_key(|e| e.item);
        assert_eq!(
            all,
            vec![
                Element::new(1, Point::new(-100.0, -100.0)),
                Element::new(2, Point::new(100.0, 100.0)),
            ]
        );
        assert_eq!(tree.get_all_bbox(), vec![tree.bounds()]);
    }
}
