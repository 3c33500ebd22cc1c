//! Shop API & Session Config

use std::{path::PathBuf, time::Duration};

use clap::{Args, ValueEnum};
use larder_app::{
    config::{ClientConfig, DEFAULT_API_URL, GuestSessionSource},
    storage::FileStorage,
};

/// Where new guest sessions come from.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum GuestSessions {
    /// Generate guest session keys locally.
    Local,

    /// Ask the shop API for guest sessions.
    Server,
}

impl From<GuestSessions> for GuestSessionSource {
    fn from(value: GuestSessions) -> Self {
        match value {
            GuestSessions::Local => Self::Local,
            GuestSessions::Server => Self::Server,
        }
    }
}

/// Shop API and session settings.
#[derive(Debug, Args)]
pub struct ClientArgs {
    /// Shop API base URL
    #[arg(long, env = "LARDER_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Request timeout in seconds
    #[arg(long, env = "LARDER_REQUEST_TIMEOUT_SECONDS", default_value_t = 10u64)]
    pub request_timeout_seconds: u64,

    /// Guest session source (local, server)
    #[arg(long, env = "LARDER_GUEST_SESSIONS", value_enum, default_value_t = GuestSessions::Local)]
    pub guest_sessions: GuestSessions,

    /// Credential file, defaults to the platform data directory
    #[arg(long, env = "LARDER_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,

    /// Keep credentials in memory only
    #[arg(long)]
    pub ephemeral: bool,

    /// Guest session expiry check interval in seconds
    #[arg(long, env = "LARDER_EXPIRY_CHECK_SECONDS", default_value_t = 60u64)]
    pub expiry_check_seconds: u64,

    /// Credential file poll interval in milliseconds
    #[arg(long, env = "LARDER_STORAGE_POLL_MILLIS", default_value_t = 500u64)]
    pub storage_poll_millis: u64,
}

impl ClientArgs {
    /// Library configuration for these settings.
    pub fn client_config(&self) -> ClientConfig {
        let storage_path = if self.ephemeral {
            None
        } else {
            self.storage_path.clone().or_else(FileStorage::default_path)
        };

        ClientConfig {
            base_url: self.api_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
            guest_sessions: self.guest_sessions.into(),
            storage_path,
            expiry_check_interval: Duration::from_secs(self.expiry_check_seconds),
            storage_poll_interval: Duration::from_millis(self.storage_poll_millis),
        }
    }
}
