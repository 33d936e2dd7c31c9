//! File-like sessions over `MemStore` buffers
//!
//! `StreamAdapter` turns a `scheme://<handle>` address into a `Session`: a
//! cursor bound to one allocation of a handle. Sessions never own the buffer;
//! every operation looks the allocation up in the store again, so a released
//! handle is noticed on the next call, even if its value has since been
//! allocated anew.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use staticmem::{MemStore, StreamAdapter, Whence};
//!
//! let store = Arc::new(MemStore::new());
//! let adapter = StreamAdapter::new(Arc::clone(&store));
//!
//! let handle = store.allocate().unwrap();
//! let mut session = adapter.open(&adapter.address_for(handle).unwrap()).unwrap();
//! session.write(b"hello").unwrap();
//! session.seek(0, Whence::Start).unwrap();
//! assert_eq!(session.read(5).unwrap(), b"hello");
//! assert!(session.eof().unwrap());
//! session.close().unwrap();
//! assert!(!store.exists(handle));
//! ```

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::address::{is_valid_scheme, Address};
use crate::config::DEFAULT_SCHEME;
use crate::error::{Error, Result};
use crate::idgen::Handle;
use crate::io::{Buffer, MemStore};
use crate::protocol::{ProtocolRegistry, StreamContext, StreamProtocol, StreamSession, Whence};

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Opens sessions on the buffers of one store
#[derive(Debug, Clone)]
pub struct StreamAdapter {
    store: Arc<MemStore>,
    scheme: String,
}

impl StreamAdapter {
    /// Adapter for `store` under the default `staticmem` scheme
    #[must_use]
    pub fn new(store: Arc<MemStore>) -> Self {
        Self {
            store,
            scheme: DEFAULT_SCHEME.to_string(),
        }
    }

    /// Adapter for `store` under a custom scheme
    ///
    /// # Errors
    /// `Error::Config` if `scheme` is not a valid URL scheme.
    pub fn with_scheme(store: Arc<MemStore>, scheme: impl Into<String>) -> Result<Self> {
        let scheme = scheme.into();
        if !is_valid_scheme(&scheme) {
            return Err(Error::Config(format!("invalid stream scheme '{scheme}'")));
        }
        Ok(Self { store, scheme })
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn store(&self) -> &Arc<MemStore> {
        &self.store
    }

    /// Address to open `handle` with
    ///
    /// # Errors
    /// `Error::UnknownHandle` if the handle is not live.
    pub fn address_for(&self, handle: Handle) -> Result<String> {
        if !self.store.exists(handle) {
            return Err(Error::UnknownHandle(handle));
        }
        Ok(Address::new(self.scheme.as_str(), handle).to_string())
    }

    /// Open a session at position 0
    ///
    /// # Errors
    /// - `Error::InvalidAddress` if `url` is not `scheme://<integer>`
    /// - `Error::UnknownHandle` if the handle is not live
    pub fn open(&self, url: &str) -> Result<Session> {
        self.open_with_context(url, StreamContext::default())
    }

    /// Open a session at position 0, keeping `context` on the session
    ///
    /// # Errors
    /// See [`StreamAdapter::open`].
    pub fn open_with_context(&self, url: &str, context: StreamContext) -> Result<Session> {
        let address = Address::parse(url, &self.scheme)?;
        let handle = address.handle();
        let generation = self.store.generation(handle).inspect_err(|_| {
            debug!(url = %url, "open of unknown handle");
        })?;
        debug!(handle = %handle, generation, "opened session");
        Ok(Session {
            store: Arc::clone(&self.store),
            handle,
            generation,
            position: 0,
            closed: false,
            context,
        })
    }

    /// Register this adapter under its scheme
    ///
    /// # Errors
    /// `Error::DuplicateRegistration` if the scheme is already registered.
    pub fn register(&self, registry: &ProtocolRegistry) -> Result<()> {
        registry.register(Arc::new(self.clone()))
    }
}

impl StreamProtocol for StreamAdapter {
    fn scheme(&self) -> &str {
        &self.scheme
    }

    fn open(&self, url: &str, context: &StreamContext) -> Result<Box<dyn StreamSession>> {
        Ok(Box::new(self.open_with_context(url, context.clone())?))
    }
}

/// A cursor bound to one handle
///
/// Several sessions may be open on the same handle. Each has its own cursor;
/// all of them see the same bytes, and a write through one is visible to the
/// others immediately.
#[derive(Debug)]
pub struct Session {
    store: Arc<MemStore>,
    handle: Handle,
    generation: u64,
    position: u64,
    closed: bool,
    context: StreamContext,
}

impl Session {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::SessionClosed);
        }
        Ok(())
    }

    fn buffer(&self) -> Result<Buffer> {
        self.ensure_open()?;
        self.store.checkout(self.handle, self.generation)
    }

    #[must_use]
    pub fn handle(&self) -> Handle {
        self.handle
    }

    #[must_use]
    pub fn context(&self) -> &StreamContext {
        &self.context
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Read up to `count` bytes and advance by the number returned
    ///
    /// Fewer than `count` bytes near the end; empty at the end.
    ///
    /// # Errors
    /// `Error::SessionClosed`, or `Error::UnknownHandle` if the handle was released elsewhere.
    pub fn read(&mut self, count: usize) -> Result<Vec<u8>> {
        let data = self.buffer()?.slice(self.position, count);
        self.position = self.position.saturating_add(to_u64(data.len()));
        trace!(handle = %self.handle, requested = count, read = data.len(), position = self.position, "read");
        Ok(data)
    }

    /// Read into `buf` and advance by the number of bytes copied
    ///
    /// # Errors
    /// See [`Session::read`].
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.buffer()?.copy_to(self.position, buf);
        self.position = self.position.saturating_add(to_u64(n));
        trace!(handle = %self.handle, requested = buf.len(), read = n, position = self.position, "read");
        Ok(n)
    }

    /// Overwrite at the cursor and advance by `data.len()`
    ///
    /// Bytes after the overwritten span are kept, so the new size is
    /// `max(size, position + data.len())`. If the cursor is past the end
    /// (another session shrank the buffer), `data` goes directly after the
    /// existing content with no zero fill, and the cursor still advances by
    /// `data.len()` from where it was.
    ///
    /// # Errors
    /// See [`Session::read`]. Nothing is written on error.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.buffer()?.overwrite_at(self.position, data);
        self.position = self.position.saturating_add(to_u64(data.len()));
        trace!(handle = %self.handle, written = data.len(), position = self.position, "write");
        Ok(data.len())
    }

    /// Current position
    ///
    /// # Errors
    /// `Error::SessionClosed`.
    pub fn tell(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.position)
    }

    /// Whether the position is at or past the end of the buffer
    ///
    /// # Errors
    /// See [`Session::read`].
    pub fn eof(&self) -> Result<bool> {
        let size = to_u64(self.buffer()?.len());
        Ok(self.position >= size)
    }

    /// Move the cursor, returning the new position
    ///
    /// The target must lie in `[0, size]`. Otherwise the call fails with
    /// `Error::SeekOutOfRange` and the position does not move.
    ///
    /// # Errors
    /// `Error::SeekOutOfRange`, plus those of [`Session::read`].
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        let size = to_u64(self.buffer()?.len());
        let base = match whence {
            Whence::Start => 0,
            Whence::Current => i128::from(self.position),
            Whence::End => i128::from(size),
        };
        let target = base + i128::from(offset);
        match u64::try_from(target) {
            Ok(position) if position <= size => {
                self.position = position;
                trace!(handle = %self.handle, position, "seek");
                Ok(position)
            }
            _ => {
                trace!(handle = %self.handle, target = %target, size, "seek rejected");
                Err(Error::SeekOutOfRange { target, size })
            }
        }
    }

    /// Release the handle from the store and close the session
    ///
    /// The session is closed even if the release fails because the handle
    /// was already released elsewhere.
    ///
    /// # Errors
    /// - `Error::SessionClosed` if already closed
    /// - `Error::UnknownHandle` if the handle was released elsewhere
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            warn!(handle = %self.handle, "close of an already closed session");
            return Err(Error::SessionClosed);
        }
        self.closed = true;
        self.store.release_generation(self.handle, self.generation)?;
        debug!(handle = %self.handle, "closed session");
        Ok(())
    }
}

impl StreamSession for Session {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_into(buf)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Session::write(self, data)
    }

    fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64> {
        Session::seek(self, offset, whence)
    }

    fn tell(&self) -> Result<u64> {
        Session::tell(self)
    }

    fn eof(&self) -> Result<bool> {
        Session::eof(self)
    }

    fn close(&mut self) -> Result<()> {
        Session::close(self)
    }
}
