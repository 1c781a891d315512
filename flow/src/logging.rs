//! Development-time tracing for lattice pipelines.
//!
//! The library only emits events (`debug!` when a loop stops, `trace!` per loop
//! step, `debug!` when a lifted function fails). Binaries decide whether to
//! install a subscriber; [`init`] is the default one.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing subscriber for development logging.
///
/// Reads `RUST_LOG` env var. Defaults to `warn` if unset.
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=flow=trace cargo run -p play -- run pipeline.toml
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
