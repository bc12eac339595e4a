//! Diagnostics for the binaries.
//!
//! The library only emits `tracing` events; the CLI and HTTP server install a
//! subscriber here. Filtering follows `RUST_LOG` and defaults to `info`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the stderr subscriber. Calling it twice is a no-op.
pub fn init() {
    init_with_default("info");
}

pub fn init_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
