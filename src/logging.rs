//! Logging bootstrap for binaries embedding the notes facade.
//!
//! The library only emits through the `log` facade; this wires those records
//! to stderr with `env_logger`.

use env_logger::{Builder, Env};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "warn";

/// Initializes stderr logging, honouring `RUST_LOG`.
///
/// Calling this more than once is harmless; later calls leave the first
/// logger in place.
pub fn init_logging() {
    init_logging_with(DEFAULT_FILTER);
}

/// Initializes stderr logging with a fallback filter such as `"debug"` or
/// `"notekeeper=info"`.
pub fn init_logging_with(default_filter: &str) {
    let _ = Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init();
}
