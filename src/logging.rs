// Terminal logging via tracing.

use tracing_subscriber::EnvFilter;

/// Initialise logging. Without `--debug` the level is pinned to `info`
/// (crate) / `warn` (dependencies) even if `RUST_LOG` is set; with it,
/// `RUST_LOG` is honoured and falls back to `debug`.
pub fn init(debug: bool) {
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("co_drawing=debug,warn"))
    } else {
        EnvFilter::new("co_drawing=info,warn")
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
