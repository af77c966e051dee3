//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Installs a formatted `tracing` subscriber for the process.
///
/// The filter comes from `RUST_LOG` and falls back to `info`. Calling this
/// more than once is harmless; later calls leave the first subscriber in
/// place.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
