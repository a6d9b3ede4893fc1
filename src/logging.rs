//! Tracing subscriber setup for the command-line binary.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "FEDGEN_LOG";

static INIT: Once = Once::new();

fn default_directive(debug: bool) -> &'static str {
    if debug {
        "fedgen=debug"
    } else {
        "fedgen=warn"
    }
}

/// Install a stderr fmt subscriber. Later calls are no-ops.
pub fn init_tracing(debug: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));
        // Another subscriber may already be installed (tests embedding the crate).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}
