//! Subscriber setup for structured logging.
//!
//! The filter sits behind a reload layer so the level can be adjusted
//! on a running server without restarting it.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};

static FILTER_RELOAD: OnceLock<reload::Handle<EnvFilter, tracing_subscriber::Registry>> =
    OnceLock::new();

pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Install the global subscriber. `RUST_LOG` wins over `level` when it
/// parses; repeated calls are no-ops.
pub fn init_tracing_with_level(level: &str) {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|_| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(level));

    let (filter_layer, handle) = reload::Layer::new(filter);
    let _ = FILTER_RELOAD.set(handle);

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer())
        .try_init();
}

/// Swap the active filter for a new level. Does nothing before
/// [`init_tracing`] has run.
pub fn apply_logging_level(level: &str) {
    if let Some(handle) = FILTER_RELOAD.get() {
        let _ = handle.modify(|filter| {
            *filter = EnvFilter::new(level);
        });
    }
}
