//! Tracing bootstrap for binaries and tests embedding the crate.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` does not override it: lifecycle events
/// from this crate's pool, graph and logger targets at debug, everything
/// else at warn.
const DEFAULT_DIRECTIVES: &str = "warn,workgraph=debug";

/// Installs a `fmt` subscriber filtered for this crate's targets.
///
/// `RUST_LOG` takes precedence over the built-in directives. If a global
/// dispatcher is already installed the call is a no-op, so every test can
/// invoke it unconditionally.
pub fn init_tracing() {
    init_tracing_with(DEFAULT_DIRECTIVES);
}

/// Like [`init_tracing`] but with caller-supplied fallback directives.
pub fn init_tracing_with(default_directives: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
