//! Storage layer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Session (stream layer)             │
//! │  - cursor per session               │
//! │  - read / write / seek / eof        │
//! └─────────────────────────────────────┘
//!          ▲
//!          │ handle-keyed operations
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  MemStore (handle table)            │
//! │  - allocate / release               │
//! │  - get / set / append / slice       │
//! └─────────────────────────────────────┘
//!          ▲
//!          │ one per handle
//!          ▼
//! ┌─────────────────────────────────────┐
//! │  Buffer (shared storage)            │
//! │  - Arc<Mutex<Vec<u8>>>              │
//! └─────────────────────────────────────┘
//! ```

pub mod buffer;
pub mod memstore;

pub use buffer::Buffer;
pub use memstore::{MemStore, Snapshot};
