//! qt-demo - walks through the quadtree API and dumps the node layout.

use quadtree::{Point, QuadTree};
use quadtree_tools::config::CONFIG_FILE;
use quadtree_tools::{experiments, init_logging, Config};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

fn main() -> anyhow::Result<()> {
    init_logging();

    info!("Quadtree demo v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(CONFIG_FILE)?;
    let tree_config = &config.tree;
    info!("Loaded configuration");
    info!("  Bounds: {:?}", tree_config.bounds);
    info!(
        "  Max elements: {}, max depth: {}",
        tree_config.thresholds.max_elements, tree_config.thresholds.max_depth
    );

    fruit_walkthrough(&config);
    scatter_layout(&config)?;

    Ok(())
}

fn fruit_walkthrough(config: &Config) {
    let mut tree = QuadTree::with_config(config.tree.bounds, config.tree.thresholds);
    tree.add("apple", Point::new(100.0, 100.0));
    tree.add("orange", Point::new(200.0, 50.0));

    for element in tree.query((50.0, 50.0, 150.0, 150.0)) {
        info!("Query hit: {} at {}", element.item, element.point);
    }

    if let Some(nearest) = tree.nearest_neighbor(Point::new(200.0, 100.0)) {
        info!("Nearest to (200, 100): {} at {}", nearest.item, nearest.point);
    }

    for element in tree.get_all_elements() {
        info!("Indexed: {} at {}", element.item, element.point);
    }
}

fn scatter_layout(config: &Config) -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(config.demo.seed);
    let points = experiments::random_points(&mut rng, config.tree.bounds, config.demo.points);
    let mut tree = experiments::build_tree(&config.tree, &points);

    let boxes = tree.get_all_bbox();
    info!(
        "Scattered {} points: {} nodes, depth {}",
        tree.len(),
        boxes.len(),
        tree.max_depth_reached()
    );
    for b in &boxes {
        debug!(
            "  node ({:.1}, {:.1}) - ({:.1}, {:.1})",
            b.min_x, b.min_y, b.max_x, b.max_y
        );
    }

    let center = Point::new(config.tree.bounds.mid_x(), config.tree.bounds.mid_y());
    for (rank, element) in tree.nearest_neighbors(center, 3).iter().enumerate() {
        info!(
            "Neighbor #{} of center: item {} at distance {:.2}",
            rank + 1,
            element.item,
            center.distance(element.point)
        );
    }

    // Deleting half the points lets emptied quadrants merge back.
    for item in (0..points.len()).step_by(2) {
        tree.delete(&item)?;
    }
    info!(
        "After deleting half: {} points, {} nodes",
        tree.len(),
        tree.node_count()
    );

    Ok(())
}
