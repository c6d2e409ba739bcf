//! Timing experiments comparing the quadtree against linear scans.

use std::time::{Duration, Instant};

use quadtree::{Bounds, Point, QuadTree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::{BenchConfig, TreeConfig};

/// Timings for one point count.
#[derive(Debug, Clone)]
pub struct ExperimentRow {
    pub size: usize,
    pub build: Duration,
    pub query_tree: Duration,
    pub query_brute: Duration,
    pub nearest_tree: Duration,
    pub nearest_brute: Duration,
    /// Total hits over all area queries (identical for both methods).
    pub query_hits: usize,
}

/// `count` uniformly random points inside `bounds`.
pub fn random_points(rng: &mut impl Rng, bounds: Bounds, count: usize) -> Vec<Point> {
    (0..count)
        .map(|_| {
            Point::new(
                rng.random_range(bounds.min_x..bounds.max_x),
                rng.random_range(bounds.min_y..bounds.max_y),
            )
        })
        .collect()
}

/// `count` random boxes anchored inside `bounds` and clipped to its max edges.
pub fn random_queries(rng: &mut impl Rng, bounds: Bounds, count: usize) -> Vec<Bounds> {
    (0..count)
        .map(|_| {
            let x = rng.random_range(bounds.min_x..bounds.max_x);
            let y = rng.random_range(bounds.min_y..bounds.max_y);
            let w = rng.random_range(0.0..=bounds.max_x - x);
            let h = rng.random_range(0.0..=bounds.max_y - y);
            Bounds::new(x, y, x + w, y + h)
        })
        .collect()
}

/// Build a tree indexing each point by its position in `points`.
pub fn build_tree(tree: &TreeConfig, points: &[Point]) -> QuadTree<usize> {
    let mut qt = QuadTree::with_config(tree.bounds, tree.thresholds);
    qt.extend(points.iter().copied().enumerate());
    qt
}

/// Count of points in `area` by linear scan, with the same half-open rule.
pub fn brute_force_query(points: &[Point], area: &Bounds) -> usize {
    points.iter().filter(|p| area.contains_half_open(**p)).count()
}

/// Index of the point nearest to `target` by linear scan.
pub fn brute_force_nearest(points: &[Point], target: Point) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .min_by(|a, b| target.distance_squared(*a.1).total_cmp(&target.distance_squared(*b.1)))
        .map(|(i, _)| i)
}

fn timed<R>(f: impl FnOnce() -> R) -> (R, Duration) {
    let start = Instant::now();
    let result = f();
    (result, start.elapsed())
}

/// Run every experiment for each configured size.
pub fn run(tree: &TreeConfig, bench: &BenchConfig) -> anyhow::Result<Vec<ExperimentRow>> {
    let mut rng = StdRng::seed_from_u64(bench.seed);
    let queries = random_queries(&mut rng, tree.bounds, bench.queries);
    let mut rows = Vec::with_capacity(bench.sizes.len());

    for &size in &bench.sizes {
        let points = random_points(&mut rng, tree.bounds, size);
        let targets = random_points(&mut rng, tree.bounds, bench.nearest_samples);

        let (qt, build) = timed(|| build_tree(tree, &points));
        debug!(
            "Built tree of {} points: {} nodes, depth {}",
            size,
            qt.node_count(),
            qt.max_depth_reached()
        );

        let (tree_hits, query_tree) =
            timed(|| queries.iter().map(|q| qt.query(*q).len()).sum::<usize>());
        let (brute_hits, query_brute) =
            timed(|| queries.iter().map(|q| brute_force_query(&points, q)).sum::<usize>());
        anyhow::ensure!(
            tree_hits == brute_hits,
            "area query mismatch at {} points: tree {} vs scan {}",
            size,
            tree_hits,
            brute_hits
        );

        let (tree_nearest, nearest_tree) = timed(|| {
            targets
                .iter()
                .map(|t| qt.nearest_neighbor(*t).map(|e| target_distance(*t, e.point)))
                .collect::<Vec<_>>()
        });
        let (brute_nearest, nearest_brute) = timed(|| {
            targets
                .iter()
                .map(|t| brute_force_nearest(&points, *t).map(|i| target_distance(*t, points[i])))
                .collect::<Vec<_>>()
        });
        anyhow::ensure!(
            tree_nearest == brute_nearest,
            "nearest neighbor mismatch at {} points",
            size
        );

        rows.push(ExperimentRow {
            size,
            build,
            query_tree,
            query_brute,
            nearest_tree,
            nearest_brute,
            query_hits: tree_hits,
        });
    }

    Ok(rows)
}

fn target_distance(target: Point, point: Point) -> f64 {
    target.distance_squared(point)
}

/// Render rows as a markdown table (seconds, three decimals).
pub fn render_markdown(rows: &[ExperimentRow]) -> String {
    let mut out = String::from(
        "| Points | Build | Query (tree) | Query (scan) | Nearest (tree) | Nearest (scan) |\n\
         |---|---|---|---|---|---|\n",
    );
    for row in rows {
        out.push_str(&format!(
            "| {} | {:.3} | {:.3} | {:.3} | {:.3} | {:.3} |\n",
            row.size,
            row.build.as_secs_f64(),
            row.query_tree.as_secs_f64(),
            row.query_brute.as_secs_f64(),
            row.nearest_tree.as_secs_f64(),
            row.nearest_brute.as_secs_f64(),
        ));
    }
    out
}
