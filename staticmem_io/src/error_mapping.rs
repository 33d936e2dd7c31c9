//! Error mapping utilities for converting between error types.
//!
//! This module converts `staticmem::Error` into `embedded_io::ErrorKind` and
//! `std::io::Error`, and error kinds into human-readable static strings.

use staticmem::Error;

/// Convert a store error to `embedded_io::ErrorKind`
#[must_use]
pub fn error_to_error_kind(error: &Error) -> embedded_io::ErrorKind {
    match error {
        Error::UnknownHandle(_) => embedded_io::ErrorKind::NotFound,
        Error::InvalidAddress { .. } | Error::SeekOutOfRange { .. } | Error::Config(_) => {
            embedded_io::ErrorKind::InvalidInput
        }
        Error::SessionClosed => embedded_io::ErrorKind::NotConnected,
        Error::DuplicateRegistration(_) => embedded_io::ErrorKind::AlreadyExists,
        Error::UnknownProtocol(_) => embedded_io::ErrorKind::Unsupported,
        Error::HandlesExhausted => embedded_io::ErrorKind::OutOfMemory,
    }
}

/// Convert a store error to `std::io::Error`, keeping it as the inner error
#[must_use]
pub fn error_to_io_error(error: Error) -> std::io::Error {
    let kind = match error {
        Error::UnknownHandle(_) => std::io::ErrorKind::NotFound,
        Error::InvalidAddress { .. } | Error::SeekOutOfRange { .. } | Error::Config(_) => {
            std::io::ErrorKind::InvalidInput
        }
        Error::SessionClosed => std::io::ErrorKind::NotConnected,
        Error::DuplicateRegistration(_) => std::io::ErrorKind::AlreadyExists,
        Error::UnknownProtocol(_) => std::io::ErrorKind::Unsupported,
        Error::HandlesExhausted => std::io::ErrorKind::OutOfMemory,
    };
    std::io::Error::new(kind, error)
}

/// Convert error kind to a static string description
#[must_use]
pub fn error_kind_to_str(kind: embedded_io::ErrorKind) -> &'static str {
    match kind {
        embedded_io::ErrorKind::NotFound => "not found",
        embedded_io::ErrorKind::InvalidInput => "invalid input",
        embedded_io::ErrorKind::NotConnected => "not connected",
        embedded_io::ErrorKind::AlreadyExists => "already exists",
        embedded_io::ErrorKind::Unsupported => "unsupported",
        embedded_io::ErrorKind::OutOfMemory => "out of memory",
        embedded_io::ErrorKind::Other => "other error",
        _ => "unknown error",
    }
}
