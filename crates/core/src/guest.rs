//! Locally generated guest session keys.

use jiff::{SignedDuration, Timestamp};
use rand::{RngCore, rngs::OsRng};

use crate::credentials::GuestSession;

/// Guest session key prefix.
pub const GUEST_SESSION_PREFIX: &str = "guest_";

/// Number of random bytes encoded in a guest session key.
pub const GUEST_SESSION_SECRET_BYTES: usize = 32;

/// Lifetime of a locally generated guest session.
pub const GUEST_SESSION_TTL: SignedDuration = SignedDuration::from_hours(7 * 24);

/// Generate a key of the form `guest_` followed by 64 lowercase hex characters.
pub fn generate_guest_session_key() -> String {
    let mut secret = [0_u8; GUEST_SESSION_SECRET_BYTES];

    OsRng.fill_bytes(&mut secret);

    encode_key(&secret)
}

/// Start a new local guest session at `now`.
///
/// # Errors
///
/// Returns an error if the expiry falls outside the supported timestamp range.
pub fn new_guest_session(now: Timestamp) -> Result<GuestSession, jiff::Error> {
    Ok(GuestSession::new(
        generate_guest_session_key(),
        now.checked_add(GUEST_SESSION_TTL)?,
    ))
}

/// Whether `key` has the shape of a locally generated guest session key.
pub fn is_guest_session_key(key: &str) -> bool {
    key.strip_prefix(GUEST_SESSION_PREFIX).is_some_and(|hex| {
        hex.len() == GUEST_SESSION_SECRET_BYTES * 2
            && hex.bytes().all(|byte| matches!(byte, b'0'..=b'9' | b'a'..=b'f'))
    })
}

fn encode_key(secret: &[u8; GUEST_SESSION_SECRET_BYTES]) -> String {
    let hex: String = secret.iter().map(|byte| format!("{byte:02x}")).collect();

    format!("{GUEST_SESSION_PREFIX}{hex}")
}
