//! JSON log output for the contacts service.
//!
//! Store and service operations run inside `#[instrument]` spans (owner,
//! document key, index name); the current span is flattened into every event
//! so a log line can be traced back to the caller that produced it.

use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset. The HTTP client stack under the CouchDB
/// store is noisy at `info`.
pub const DEFAULT_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Install the process-wide subscriber. Later calls are no-ops.
pub fn init() {
    init_with_default(DEFAULT_FILTER);
}

/// Like [`init`], with a different fallback filter.
pub fn init_with_default(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
