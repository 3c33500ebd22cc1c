//! Cart errors.

use thiserror::Error;

use crate::{domain::sessions::SessionError, http::ApiError};

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    #[error("Failed to initialize session")]
    SessionBootstrap(#[source] SessionError),

    #[error("Session expired. Please refresh the page.")]
    SessionExpired,

    #[error("{message}")]
    Request {
        message: String,

        #[source]
        source: ApiError,
    },
}

impl CartError {
    /// Message suitable for showing to the user.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Wrap a failed request, preferring the server's message over `fallback`.
    pub(crate) fn request(source: ApiError, fallback: &str) -> Self {
        Self::Request {
            message: source.user_message(fallback),
            source,
        }
    }
}
