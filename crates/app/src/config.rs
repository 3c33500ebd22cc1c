//! Client configuration.

use std::{path::PathBuf, time::Duration};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_EXPIRY_CHECK_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_STORAGE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Where new guest sessions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuestSessionSource {
    /// Generated on the client.
    #[default]
    Local,

    /// Issued by the shop API.
    Server,
}

/// Settings for building an [`AppContext`](crate::context::AppContext).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Shop API base URL, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Timeout applied to every request
    pub request_timeout: Duration,

    pub guest_sessions: GuestSessionSource,

    /// Credential file. `None` keeps credentials in memory only.
    pub storage_path: Option<PathBuf>,

    /// How often the guest session expiry is checked
    pub expiry_check_interval: Duration,

    /// How often the credential file is re-read for changes made by other processes
    pub storage_poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            guest_sessions: GuestSessionSource::default(),
            storage_path: None,
            expiry_check_interval: DEFAULT_EXPIRY_CHECK_INTERVAL,
            storage_poll_interval: DEFAULT_STORAGE_POLL_INTERVAL,
        }
    }
}
