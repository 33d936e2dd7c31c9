//! Named in-memory byte buffers behind a file-like stream interface.
//!
//! Allocate a handle in a [`MemStore`], address it as `staticmem://<handle>`,
//! and open, read, write, seek and close it through a [`StreamAdapter`]
//! session or through any [`ProtocolRegistry`] the adapter is registered with.

pub mod address;
pub mod config;
pub mod error;
pub mod idgen;
pub mod io;
pub mod protocol;
pub mod stream;

pub use address::Address;
pub use config::{HandlePolicy, StoreConfig, DEFAULT_SCHEME};
pub use error::{Error, Result};
pub use idgen::{Handle, IdGen};
pub use io::{Buffer, MemStore, Snapshot};
pub use protocol::{ProtocolRegistry, StreamContext, StreamProtocol, StreamSession, Whence};
pub use stream::{Session, StreamAdapter};
