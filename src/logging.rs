//! Logging setup
//!
//! Logs go to stderr; stdout is reserved for JSON output.

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. RUST_LOG wins over `verbose`.
pub fn init(verbose: bool) {
    let default_level = if verbose { "pouchcost_core=debug" } else { "pouchcost_core=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // A second init (e.g. from an embedding host) keeps the first subscriber
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Debug-level logging captured by the test harness
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
