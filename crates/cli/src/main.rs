//! Larder command line client

use std::process;

use tracing::{debug, error};

use larder_app::context::AppContext;

use crate::config::CliConfig;

mod commands;
mod config;
mod observability;
mod shutdown;

/// Larder command line client entry point
#[tokio::main]
pub async fn main() {
    // Load configuration from .env and CLI arguments
    let config = CliConfig::load().unwrap_or_else(|error| error.exit());

    if let Err(error) = observability::init_subscriber(&config.logging) {
        #[expect(
            clippy::print_stderr,
            reason = "logging failed to initialise, must use eprintln"
        )]
        {
            eprintln!("Logging error: {error}");
        }

        process::exit(1);
    }

    let client = config.client.client_config();

    debug!(
        base_url = %client.base_url,
        storage = ?client.storage_path,
        "starting larder client"
    );

    let app = match AppContext::from_config(client) {
        Ok(app) => app,
        Err(init_error) => {
            error!("failed to initialise client: {init_error}");

            process::exit(1);
        }
    };

    if let Err(message) = commands::run(&app, &config.command).await {
        #[expect(clippy::print_stderr, reason = "command errors are user facing output")]
        {
            eprintln!("Error: {message}");
        }

        process::exit(1);
    }
}
