//! qt-bench - times tree building, area queries and nearest-neighbor search.

use quadtree_tools::config::CONFIG_FILE;
use quadtree_tools::{experiments, init_logging, Config};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_logging();

    info!("Quadtree bench v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load(CONFIG_FILE)?;
    info!("Loaded configuration");
    info!("  Sizes: {:?}", config.bench.sizes);
    info!(
        "  Queries: {}, nearest samples: {}",
        config.bench.queries, config.bench.nearest_samples
    );

    let rows = experiments::run(&config.tree, &config.bench)?;
    println!("{}", experiments::render_markdown(&rows));

    Ok(())
}
