//! Shared pieces of the quadtree demo and benchmark binaries.

pub mod config;
pub mod experiments;

pub use config::Config;

use tracing_subscriber::EnvFilter;

/// Install the `tracing` subscriber, honoring `RUST_LOG`.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
