//! Error types for store, address and stream operations.

use thiserror::Error;

use crate::idgen::Handle;

/// Result type alias for staticmem operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the store, the stream adapter and the protocol registry.
///
/// Every operation reports the specific kind to its immediate caller.
/// Nothing is retried or recovered silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The handle is not present in the store (never allocated or already released).
    #[error("invalid static memory handle: {0}")]
    UnknownHandle(Handle),

    /// The address string is not of the form `scheme://<integer>`.
    #[error("invalid stream address '{address}': {reason}")]
    InvalidAddress {
        /// The rejected address.
        address: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The seek target is outside `[0, size]`. The position is unchanged.
    #[error("seek out of range: target {target} not in [0, {size}]")]
    SeekOutOfRange {
        /// Requested position; `i128` so that negative and overflowing targets are representable.
        target: i128,
        /// Buffer size at the time of the seek.
        size: u64,
    },

    /// The session was closed by an earlier `close()`.
    #[error("session is closed")]
    SessionClosed,

    /// A protocol with this scheme is already registered.
    #[error("failed to register {0}:// protocol: already registered")]
    DuplicateRegistration(String),

    /// No protocol is registered for this scheme.
    #[error("no protocol registered for {0}://")]
    UnknownProtocol(String),

    /// Every value of the configured handle range is in use.
    #[error("no free handle left in the configured range")]
    HandlesExhausted,

    /// A configuration value could not be used.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn invalid_address(address: &str, reason: &'static str) -> Self {
        Self::InvalidAddress {
            address: address.to_string(),
            reason,
        }
    }
}
