use std::sync::Once;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FLUID_TOKENS_LOG";
const DEFAULT_FILTER: &str = "fluid_tokens=info";

static INIT: Once = Once::new();

/// Install the stderr subscriber; stdout is reserved for CSS and JSON output.
pub fn init() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        if let Err(err) = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
        {
            eprintln!("logging already initialised: {err}");
        }
    });
}
