//! Generic stream-protocol mechanism
//!
//! A `ProtocolRegistry` maps scheme names to `StreamProtocol` implementations.
//! Opening `scheme://...` through the registry dispatches to the protocol
//! registered under `scheme`, which returns a boxed `StreamSession`.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::address::split_scheme;
use crate::error::{Error, Result};

/// Origin of a seek offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Offset from the start of the buffer
    Start,
    /// Offset from the current position
    Current,
    /// Offset from the end of the buffer
    End,
}

/// Options passed at open time
///
/// Protocols may keep the context and expose it to their sessions; the
/// in-memory adapter stores it without interpreting any key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamContext {
    opts: HashMap<String, serde_json::Value>,
}

impl StreamContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(opts: HashMap<String, serde_json::Value>) -> Self {
        Self { opts }
    }

    /// Build a context from a JSON object.
    ///
    /// # Errors
    /// `Error::Config` if the input is not a JSON object.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let opts: HashMap<String, serde_json::Value> = serde_json::from_slice(data)
            .map_err(|e| Error::Config(format!("failed to parse stream context JSON: {e}")))?;
        Ok(Self { opts })
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.opts.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.opts.get(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opts.is_empty()
    }

    #[must_use]
    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, String, serde_json::Value> {
        self.opts.iter()
    }
}

impl<'a> IntoIterator for &'a StreamContext {
    type Item = (&'a String, &'a serde_json::Value);
    type IntoIter = std::collections::hash_map::Iter<'a, String, serde_json::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.opts.iter()
    }
}

/// An open stream with a cursor
pub trait StreamSession: Send {
    /// Read into `buf`, returning the number of bytes read; 0 at end of stream.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write all of `data` at the cursor, returning `data.len()`.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Move the cursor and return the new position.
    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64>;

    /// Current position.
    fn tell(&self) -> Result<u64>;

    /// Whether the cursor is at or past the end of the stream.
    fn eof(&self) -> Result<bool>;

    /// Close the stream. Every later call fails.
    fn close(&mut self) -> Result<()>;
}

/// A stream protocol, registered under its scheme
pub trait StreamProtocol: Send + Sync {
    /// Scheme name, the part before `://`
    fn scheme(&self) -> &str;

    /// Open `url`, which starts with `scheme()://`.
    fn open(&self, url: &str, context: &StreamContext) -> Result<Box<dyn StreamSession>>;
}

/// Registry mapping scheme names to protocols
#[derive(Default)]
pub struct ProtocolRegistry {
    protocols: RwLock<HashMap<String, Arc<dyn StreamProtocol>>>,
}

impl ProtocolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a protocol under its scheme
    ///
    /// # Errors
    /// `Error::DuplicateRegistration` if the scheme is taken; the existing
    /// protocol stays registered.
    pub fn register(&self, protocol: Arc<dyn StreamProtocol>) -> Result<()> {
        let scheme = protocol.scheme().to_string();
        let mut protocols = self.protocols.write();
        if protocols.contains_key(&scheme) {
            warn!(scheme = %scheme, "protocol already registered");
            return Err(Error::DuplicateRegistration(scheme));
        }
        debug!(scheme = %scheme, "registered protocol");
        protocols.insert(scheme, protocol);
        Ok(())
    }

    /// Remove a protocol, returning whether it was registered
    pub fn unregister(&self, scheme: &str) -> bool {
        let removed = self.protocols.write().remove(scheme).is_some();
        if removed {
            debug!(scheme = %scheme, "unregistered protocol");
        }
        removed
    }

    #[must_use]
    pub fn is_registered(&self, scheme: &str) -> bool {
        self.protocols.read().contains_key(scheme)
    }

    /// Registered schemes, sorted
    #[must_use]
    pub fn schemes(&self) -> Vec<String> {
        let mut schemes: Vec<String> = self.protocols.read().keys().cloned().collect();
        schemes.sort();
        schemes
    }

    /// Open `url` with the protocol registered for its scheme
    ///
    /// # Errors
    /// - `Error::InvalidAddress` if `url` has no valid `scheme://` prefix
    /// - `Error::UnknownProtocol` if no protocol is registered for the scheme
    /// - whatever the protocol's `open` reports
    pub fn open(&self, url: &str, context: &StreamContext) -> Result<Box<dyn StreamSession>> {
        let (scheme, _) = split_scheme(url)?;
        let protocol = self
            .protocols
            .read()
            .get(scheme)
            .cloned()
            .ok_or_else(|| Error::UnknownProtocol(scheme.to_string()))?;
        protocol.open(url, context)
    }
}

impl std::fmt::Debug for ProtocolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProtocolRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_from_json() {
        let context = StreamContext::from_json(br#"{"custom": "foo", "n": 3}"#).unwrap();
        assert_eq!(context.get("custom"), Some(&serde_json::json!("foo")));
        assert_eq!(context.get("n"), Some(&serde_json::json!(3)));
        assert_eq!(context.get("missing"), None);
    }

    #[test]
    fn test_context_rejects_non_object() {
        assert!(matches!(
            StreamContext::from_json(b"[1, 2]"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_context_builder() {
        let context = StreamContext::new().with("custom", "foo");
        assert!(!context.is_empty());
        assert_eq!(context.iter().count(), 1);
    }

    #[test]
    fn test_open_without_separator_is_invalid_address() {
        let registry = ProtocolRegistry::new();
        let result = registry.open("staticmem:12", &StreamContext::new());
        assert!(matches!(result, Err(Error::InvalidAddress { .. })));
    }

    #[test]
    fn test_open_unregistered_scheme() {
        let registry = ProtocolRegistry::new();
        let result = registry.open("nosuch://1", &StreamContext::new());
        assert!(matches!(result, Err(Error::UnknownProtocol(s)) if s == "nosuch"));
    }
}
