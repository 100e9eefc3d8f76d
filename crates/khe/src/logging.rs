//! Log output for solver runs.
//!
//! Solvers log through `tracing`: `info` for solve lifecycle, `debug` for
//! per-node results, `trace` for individual moves. The level is taken from
//! `RUST_LOG`, defaulting to `khe=info`.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: OnceLock<()> = OnceLock::new();

const DEFAULT_DIRECTIVE: &str = "khe=info";

/// Installs a formatting subscriber filtered by `RUST_LOG`.
///
/// Safe to call multiple times - only the first call has effect, and a
/// subscriber installed elsewhere is left in place.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init();
    });
}
