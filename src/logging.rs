//! Structured logging setup.
//!
//! All observable logs (spec.md §6) go to stderr through `tracing`, filtered
//! by `RUST_LOG` and defaulting to `info`. No format stability is promised
//! to external tooling, matching the spec.

use tracing_subscriber::EnvFilter;

/// Installs the process-wide `tracing` subscriber. Call once, before
/// anything else logs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
