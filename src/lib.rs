pub mod cli;
pub mod config;
pub mod error;
pub mod fluid;
pub mod logging;
pub mod service;
pub mod snapshot;
pub mod storage;
pub mod tokens;
pub mod viewport;
pub use error::{AppError, AppResult, ErrorKind};

use clap::Parser;

/// Entrypoint used by the `fluid-tokens` binary.
pub fn run() -> AppResult<()> {
    logging::init();
    let cli = cli::Cli::parse();
    let config = config::load_app_config();
    tracing::debug!(source = ?config.viewport.source, "loaded app config");

    cli::execute(cli, &config)
}
