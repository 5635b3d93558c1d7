//! Log output for applications embedding sessionlink.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset. Matches every `sessionlink*`
/// crate target.
pub const DEFAULT_FILTER: &str = "sessionlink=info";

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// [`DEFAULT_FILTER`].
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
