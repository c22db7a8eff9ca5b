use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins; otherwise `info`, or
/// `debug` for this crate when `verbose` is set.
pub fn init(verbose: bool) {
    let fmt_layer = fmt::layer().with_target(false);
    let fallback = if verbose {
        "info,owonero_proxy=debug,tower_http=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
