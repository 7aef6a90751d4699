//! Structured logging setup: `tracing-subscriber` + `EnvFilter`.

use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber. `verbose` lowers the
/// default filter to `debug` when `RUST_LOG` is unset.
pub fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
