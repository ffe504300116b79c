//! Tracing/logging initialization.
//!
//! The library crates only emit `tracing` events; whether and how they are
//! rendered is the host's call. This helper wires a sensible default.

use tracing_subscriber::EnvFilter;

/// Install a JSON-formatted subscriber filtered through `RUST_LOG`,
/// defaulting to `info`.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
