//! A file-like handle on a registered stream.
//!
//! `MemFile` implements both [`embedded_io`] and [`std::io`] `Read`, `Write`
//! and `Seek`, so generic I/O code can drive a `staticmem://` buffer.
//!
//! # Example
//! ```
//! use std::io::{BufRead, BufReader, Seek, Write};
//! use std::sync::Arc;
//! use staticmem::{MemStore, ProtocolRegistry, StreamAdapter, StreamContext};
//! use staticmem_io::MemFile;
//!
//! let store = Arc::new(MemStore::new());
//! let registry = ProtocolRegistry::new();
//! let adapter = StreamAdapter::new(Arc::clone(&store));
//! adapter.register(&registry).unwrap();
//!
//! let handle = store.allocate().unwrap();
//! let url = adapter.address_for(handle).unwrap();
//! let mut file = MemFile::open(&registry, &url, &StreamContext::new()).unwrap();
//! file.write_all(b"one\ntwo\n").unwrap();
//! file.rewind().unwrap();
//!
//! let lines: Vec<String> = BufReader::new(&mut file).lines().map(Result::unwrap).collect();
//! assert_eq!(lines, vec!["one", "two"]);
//! file.close().unwrap();
//! ```
//!
//! Dropping a `MemFile` without `close()` keeps the buffer in the store.

use staticmem::{ProtocolRegistry, StreamContext, StreamSession, Whence};

use crate::error_mapping::{error_to_error_kind, error_to_io_error};

pub struct MemFile {
    session: Box<dyn StreamSession>,
}

impl MemFile {
    /// Open `url` through `registry`.
    ///
    /// # Errors
    /// Whatever the registry or the protocol reports for `url`.
    pub fn open(
        registry: &ProtocolRegistry,
        url: &str,
        context: &StreamContext,
    ) -> staticmem::Result<Self> {
        Ok(Self {
            session: registry.open(url, context)?,
        })
    }

    /// Wrap an already open session.
    #[must_use]
    pub fn from_session(session: Box<dyn StreamSession>) -> Self {
        Self { session }
    }

    /// Whether the cursor is at the end of the stream.
    ///
    /// # Errors
    /// If the session is closed or its handle was released.
    pub fn eof(&self) -> staticmem::Result<bool> {
        self.session.eof()
    }

    /// Current position.
    ///
    /// # Errors
    /// If the session is closed.
    pub fn tell(&self) -> staticmem::Result<u64> {
        self.session.tell()
    }

    /// Close the stream, releasing its buffer.
    ///
    /// # Errors
    /// If the session is already closed or its handle was released elsewhere.
    pub fn close(&mut self) -> staticmem::Result<()> {
        self.session.close()
    }
}

fn split_seek_from(pos: embedded_io::SeekFrom) -> Option<(i64, Whence)> {
    match pos {
        embedded_io::SeekFrom::Start(offset) => {
            i64::try_from(offset).ok().map(|offset| (offset, Whence::Start))
        }
        embedded_io::SeekFrom::Current(offset) => Some((offset, Whence::Current)),
        embedded_io::SeekFrom::End(offset) => Some((offset, Whence::End)),
    }
}

impl embedded_io::ErrorType for MemFile {
    type Error = embedded_io::ErrorKind;
}

impl embedded_io::Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.session
            .read(buf)
            .map_err(|e| error_to_error_kind(&e))
    }
}

impl embedded_io::Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.session
            .write(buf)
            .map_err(|e| error_to_error_kind(&e))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Seek for MemFile {
    fn seek(&mut self, pos: embedded_io::SeekFrom) -> Result<u64, Self::Error> {
        let (offset, whence) = split_seek_from(pos).ok_or(embedded_io::ErrorKind::InvalidInput)?;
        self.session
            .seek(offset, whence)
            .map_err(|e| error_to_error_kind(&e))
    }
}

impl std::io::Read for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.session.read(buf).map_err(error_to_io_error)
    }
}

impl std::io::Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.session.write(buf).map_err(error_to_io_error)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl std::io::Seek for MemFile {
    fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
        let (offset, whence) = match pos {
            std::io::SeekFrom::Start(offset) => (
                i64::try_from(offset).map_err(|e| {
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
                })?,
                Whence::Start,
            ),
            std::io::SeekFrom::Current(offset) => (offset, Whence::Current),
            std::io::SeekFrom::End(offset) => (offset, Whence::End),
        };
        self.session.seek(offset, whence).map_err(error_to_io_error)
    }
}

impl core::fmt::Debug for MemFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemFile")
            .field("position", &self.session.tell().ok())
            .finish()
    }
}
