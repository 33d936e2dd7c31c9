//! Handles and handle generation

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identifier of one in-memory buffer
///
/// Printed in decimal, which is also its form inside a stream address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Handle {
    id: u64,
}

impl Handle {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Thread-safe ID generator
#[derive(Debug)]
pub struct IdGen {
    next_id: AtomicU64,
}

impl IdGen {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self {
            next_id: AtomicU64::new(first),
        }
    }

    /// Get the next unique ID
    pub fn get_next(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

fn random_u64() -> Option<u64> {
    let mut bytes = [0u8; 8];
    getrandom::getrandom(&mut bytes).ok()?;
    Some(u64::from_le_bytes(bytes))
}

/// Draw a uniformly distributed value from `min..=max`.
///
/// Raw draws from the incomplete last block of `span` values are rejected,
/// so every value of the range is equally likely.
///
/// Returns `None` when the system entropy source is unavailable.
pub(crate) fn random_in_range(min: u64, max: u64) -> Option<u64> {
    let Some(span) = (max - min).checked_add(1) else {
        // The range covers all of u64
        return random_u64();
    };
    // 2^64 mod span: raw values above the last full block of `span`
    let rejected = (u64::MAX - span + 1) % span;
    loop {
        let raw = random_u64()?;
        if raw <= u64::MAX - rejected {
            return Some(min + raw % span);
        }
    }
}
