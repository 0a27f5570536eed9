//! Tracing setup.
//!
//! Logs go to stderr so stdout stays usable for `versions --json`. By default
//! only warnings are shown, so log lines do not break up the progress display.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "GOINSTALL_LOG";

/// Installs the global subscriber.
///
/// `GOINSTALL_LOG` wins if set; otherwise the library logs at `warn`, or at
/// `debug` with `--verbose`.
pub fn init(verbose: bool) {
    let default = if verbose { "goinstall=debug" } else { "goinstall=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
