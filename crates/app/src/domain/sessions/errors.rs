//! Session errors.

use thiserror::Error;

use crate::{http::ApiError, storage::StorageError};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session request failed")]
    Api(#[from] ApiError),

    #[error("credential storage failed")]
    Storage(#[from] StorageError),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("no guest session")]
    NoGuestSession,

    #[error("no refresh token")]
    NoRefreshToken,

    #[error("guest session expiry out of range")]
    Expiry(#[source] jiff::Error),
}
