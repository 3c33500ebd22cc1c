//! Client configuration module

use clap::Parser;

use crate::{
    commands::Command,
    config::{client::ClientArgs, observability::LoggingConfig},
};

pub(crate) mod client;
pub(crate) mod observability;

/// Larder command line client configuration
#[derive(Debug, Parser)]
#[command(name = "larder", about = "Larder shop cart client", long_about = None)]
pub struct CliConfig {
    /// Shop API and session settings.
    #[command(flatten)]
    pub client: ClientArgs,

    /// Logging output settings.
    #[command(flatten)]
    pub logging: LoggingConfig,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}
