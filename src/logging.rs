//! Diagnostic logging setup
//!
//! Logs go to stderr; stdout is reserved for command results such as the
//! computed version. `--verbose` forces `debug`; otherwise the filter comes
//! from `CI_EXCELLENCE_LOG` (same syntax as `RUST_LOG`), falling back to `warn`.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "CI_EXCELLENCE_LOG";

static INIT: Once = Once::new();

/// Filter directive used when `CI_EXCELLENCE_LOG` is unset or invalid
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}

/// Build the filter from an explicit value of `CI_EXCELLENCE_LOG`
///
/// `verbose` takes precedence over the variable.
pub fn build_filter(value: Option<&str>, verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new(default_directive(true));
    }
    value
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive(verbose)))
}

/// Install the global subscriber; later calls are ignored
pub fn init(filter_value: Option<&str>, verbose: bool) {
    let filter = build_filter(filter_value, verbose);
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
