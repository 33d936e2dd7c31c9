//! In-memory handle table
//!
//! `MemStore` is the only owner of buffers. Allocation is the only way to add
//! an entry and release is the only way to remove one.
//!
//! Each allocation also gets a generation number that is never reused, so a
//! session opened on one allocation can tell it apart from a later allocation
//! that happens to reuse the same handle value.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

use super::buffer::Buffer;
use crate::config::{HandlePolicy, StoreConfig};
use crate::error::{Error, Result};
use crate::idgen::{random_in_range, Handle, IdGen};

/// Random draws tried before falling back to a linear probe
const MAX_RANDOM_ATTEMPTS: usize = 16;

/// One live allocation
#[derive(Debug, Clone)]
struct Slot {
    buffer: Buffer,
    generation: u64,
}

/// Table of handle → buffer
///
/// Share it between adapters and sessions as `Arc<MemStore>`.
///
/// # Thread Safety
///
/// The table is guarded by one `parking_lot::Mutex`, held only for lookups,
/// inserts and removals. Buffer contents are guarded by each buffer's own
/// lock, which is taken after the table lock is released.
///
/// # Example
///
/// ```
/// use staticmem::io::MemStore;
///
/// let store = MemStore::new();
/// let handle = store.allocate().unwrap();
/// store.append(handle, b"hello").unwrap();
/// assert_eq!(store.get(handle).unwrap(), b"hello");
/// store.release(handle).unwrap();
/// assert!(!store.exists(handle));
/// ```
pub struct MemStore {
    slots: Mutex<HashMap<Handle, Slot>>,
    idgen: IdGen,
    generations: IdGen,
    policy: HandlePolicy,
}

impl MemStore {
    /// Create a new empty store with sequential handles
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            idgen: IdGen::new(),
            generations: IdGen::new(),
            policy: HandlePolicy::Sequential,
        }
    }

    /// Create a new empty store
    ///
    /// # Errors
    /// `Error::Config` if the handle policy is invalid.
    pub fn with_config(config: &StoreConfig) -> Result<Self> {
        config.handle_policy.validate()?;
        Ok(Self {
            slots: Mutex::new(HashMap::new()),
            idgen: IdGen::new(),
            generations: IdGen::new(),
            policy: config.handle_policy,
        })
    }

    #[must_use]
    pub fn policy(&self) -> HandlePolicy {
        self.policy
    }

    /// Generate a handle not currently live and attach an empty buffer to it
    ///
    /// # Errors
    /// `Error::HandlesExhausted` if the random range has no free value left.
    pub fn allocate(&self) -> Result<Handle> {
        let mut slots = self.slots.lock();
        let handle = match self.policy {
            HandlePolicy::Sequential => self.next_sequential(&slots),
            HandlePolicy::Random { min, max } => Self::next_random(&slots, min, max)?,
        };
        let generation = self.generations.get_next();
        slots.insert(
            handle,
            Slot {
                buffer: Buffer::new(),
                generation,
            },
        );
        debug!(handle = %handle, generation, live = slots.len(), "allocated handle");
        Ok(handle)
    }

    fn next_sequential(&self, slots: &HashMap<Handle, Slot>) -> Handle {
        loop {
            let handle = Handle::new(self.idgen.get_next());
            if !slots.contains_key(&handle) {
                return handle;
            }
        }
    }

    fn next_random(slots: &HashMap<Handle, Slot>, min: u64, max: u64) -> Result<Handle> {
        // Handles of this store all come from the range, so a full table means a full range
        let live = u64::try_from(slots.len()).unwrap_or(u64::MAX);
        if let Some(span) = (max - min).checked_add(1) {
            if live >= span {
                return Err(Error::HandlesExhausted);
            }
        }

        let mut candidate = min;
        for _ in 0..MAX_RANDOM_ATTEMPTS {
            let Some(drawn) = random_in_range(min, max) else {
                trace!("entropy source unavailable, probing handles linearly");
                break;
            };
            candidate = drawn;
            if !slots.contains_key(&Handle::new(candidate)) {
                return Ok(Handle::new(candidate));
            }
        }

        // At least one value of the range is free, so the probe terminates
        loop {
            if !slots.contains_key(&Handle::new(candidate)) {
                return Ok(Handle::new(candidate));
            }
            candidate = if candidate == max { min } else { candidate + 1 };
        }
    }

    fn lookup(&self, handle: Handle) -> Result<Buffer> {
        self.slots
            .lock()
            .get(&handle)
            .map(|slot| slot.buffer.clone())
            .ok_or(Error::UnknownHandle(handle))
    }

    /// Generation of the allocation currently behind `handle`
    pub(crate) fn generation(&self, handle: Handle) -> Result<u64> {
        self.slots
            .lock()
            .get(&handle)
            .map(|slot| slot.generation)
            .ok_or(Error::UnknownHandle(handle))
    }

    /// Buffer of `handle`, only if it still belongs to allocation `generation`
    pub(crate) fn checkout(&self, handle: Handle, generation: u64) -> Result<Buffer> {
        match self.slots.lock().get(&handle) {
            Some(slot) if slot.generation == generation => Ok(slot.buffer.clone()),
            _ => Err(Error::UnknownHandle(handle)),
        }
    }

    /// Release `handle`, only if it still belongs to allocation `generation`
    pub(crate) fn release_generation(&self, handle: Handle, generation: u64) -> Result<()> {
        let mut slots = self.slots.lock();
        match slots.get(&handle) {
            Some(slot) if slot.generation == generation => {
                slots.remove(&handle);
                debug!(handle = %handle, generation, live = slots.len(), "released handle");
                Ok(())
            }
            _ => Err(Error::UnknownHandle(handle)),
        }
    }

    /// Check if the handle is live
    #[must_use]
    pub fn exists(&self, handle: Handle) -> bool {
        self.slots.lock().contains_key(&handle)
    }

    /// Copy of the whole buffer
    ///
    /// # Errors
    /// `Error::UnknownHandle` if the handle is not live.
    pub fn get(&self, handle: Handle) -> Result<Vec<u8>> {
        Ok(self.lookup(handle)?.to_vec())
    }

    /// Replace the buffer wholesale
    ///
    /// # Errors
    /// `Error::UnknownHandle` if the handle is not live.
    pub fn set(&self, handle: Handle, data: &[u8]) -> Result<()> {
        self.lookup(handle)?.replace(data);
        Ok(())
    }

    /// Concatenate to the buffer
    ///
    /// # Errors
    /// `Error::UnknownHandle` if the handle is not live.
    pub fn append(&self, handle: Handle, data: &[u8]) -> Result<()> {
        self.lookup(handle)?.append(data);
        Ok(())
    }

    /// Up to `length` bytes starting at `offset`
    ///
    /// An offset at or past the end gives an empty result, not an error.
    ///
    /// # Errors
    /// `Error::UnknownHandle` if the handle is not live.
    pub fn slice(&self, handle: Handle, offset: u64, length: usize) -> Result<Vec<u8>> {
        Ok(self.lookup(handle)?.slice(offset, length))
    }

    /// Overwrite `data.len()` bytes at `position`, keeping the tail
    ///
    /// See [`Buffer::overwrite_at`] for the past-the-end behavior.
    ///
    /// # Errors
    /// `Error::UnknownHandle` if the handle is not live.
    pub fn overwrite_at(&self, handle: Handle, position: u64, data: &[u8]) -> Result<()> {
        self.lookup(handle)?.overwrite_at(position, data);
        Ok(())
    }

    /// Current buffer length
    ///
    /// # Errors
    /// `Error::UnknownHandle` if the handle is not live.
    pub fn size(&self, handle: Handle) -> Result<u64> {
        let len = self.lookup(handle)?.len();
        Ok(u64::try_from(len).unwrap_or(u64::MAX))
    }

    /// Remove the handle and drop its buffer
    ///
    /// # Errors
    /// `Error::UnknownHandle` if the handle is not live, including a second release.
    pub fn release(&self, handle: Handle) -> Result<()> {
        let mut slots = self.slots.lock();
        let Some(slot) = slots.remove(&handle) else {
            return Err(Error::UnknownHandle(handle));
        };
        debug!(handle = %handle, generation = slot.generation, live = slots.len(), "released handle");
        Ok(())
    }

    /// Number of live handles
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Copy of the full table, for debugging
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let buffers: Vec<(Handle, Buffer)> = self
            .slots
            .lock()
            .iter()
            .map(|(handle, slot)| (*handle, slot.buffer.clone()))
            .collect();
        Snapshot(
            buffers
                .into_iter()
                .map(|(handle, buffer)| (handle, buffer.to_vec()))
                .collect(),
        )
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemStore")
            .field("live", &self.len())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Point-in-time copy of a store's table, ordered by handle
///
/// Later changes to the store are not reflected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<Handle, Vec<u8>>);

impl Snapshot {
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&[u8]> {
        self.0.get(&handle).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &[u8])> {
        self.0.iter().map(|(handle, data)| (*handle, data.as_slice()))
    }
}
