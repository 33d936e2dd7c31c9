//! Shared buffer with internal locking
//!
//! Every operation takes the buffer's lock for its whole duration, so
//! concurrent reads and writes on one buffer never interleave at the byte level.

use parking_lot::Mutex;
use std::sync::Arc;

/// Shared buffer with internal locking
///
/// A thread-safe buffer backed by `Arc<Mutex<Vec<u8>>>`. Multiple clones
/// share the same underlying data.
///
/// # Example
///
/// ```
/// use staticmem::io::Buffer;
///
/// let buffer = Buffer::new();
/// buffer.append(b"hello");
/// buffer.overwrite_at(0, b"J");
/// assert_eq!(buffer.to_vec(), b"Jello");
/// ```
#[derive(Clone, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    /// Create a new empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }

    /// Append data to the buffer
    pub fn append(&self, data: &[u8]) {
        self.0.lock().extend_from_slice(data);
    }

    /// Replace the whole content
    pub fn replace(&self, data: &[u8]) {
        let mut buf = self.0.lock();
        buf.clear();
        buf.extend_from_slice(data);
    }

    /// Copy of the whole content
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.lock().clone()
    }

    /// Up to `length` bytes starting at `offset`
    ///
    /// Returns an empty vector if `offset` is at or past the end, and only the
    /// available bytes if the range runs past the end. Never pads.
    #[must_use]
    pub fn slice(&self, offset: u64, length: usize) -> Vec<u8> {
        let buf = self.0.lock();
        let Ok(start) = usize::try_from(offset) else {
            return Vec::new();
        };
        if start >= buf.len() {
            return Vec::new();
        }
        let end = start.saturating_add(length).min(buf.len());
        buf[start..end].to_vec()
    }

    /// Copy bytes starting at `offset` into `out`, returning the count copied
    pub fn copy_to(&self, offset: u64, out: &mut [u8]) -> usize {
        let buf = self.0.lock();
        let Ok(start) = usize::try_from(offset) else {
            return 0;
        };
        if start >= buf.len() {
            return 0;
        }
        let n = out.len().min(buf.len() - start);
        out[..n].copy_from_slice(&buf[start..start + n]);
        n
    }

    /// Overwrite `data.len()` bytes starting at `position`
    ///
    /// Bytes after the overwritten span are kept. If `position` is past the
    /// end, `data` is appended directly after the existing content: the gap
    /// is not zero-filled.
    pub fn overwrite_at(&self, position: u64, data: &[u8]) {
        let mut buf = self.0.lock();
        let len = buf.len();
        match usize::try_from(position) {
            Ok(start) if start < len => {
                let end = start.saturating_add(data.len()).min(len);
                buf.splice(start..end, data.iter().copied());
            }
            _ => buf.extend_from_slice(data),
        }
    }

    /// Get the current length of the buffer
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Check if the buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Buffer(len={})", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = Buffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_clone_shares_data() {
        let buffer1 = Buffer::new();
        let buffer2 = buffer1.clone();

        buffer1.append(b"from buffer1");

        assert_eq!(buffer2.to_vec(), b"from buffer1");
    }

    #[test]
    fn test_slice_never_pads() {
        let buffer = Buffer::new();
        buffer.append(b"0123456789");

        assert_eq!(buffer.slice(2, 3), b"234");
        assert_eq!(buffer.slice(8, 100), b"89");
        assert!(buffer.slice(10, 1).is_empty());
        assert!(buffer.slice(u64::MAX, 1).is_empty());
    }

    #[test]
    fn test_copy_to_partial() {
        let buffer = Buffer::new();
        buffer.append(b"abc");

        let mut out = [0u8; 8];
        assert_eq!(buffer.copy_to(1, &mut out), 2);
        assert_eq!(&out[..2], b"bc");
        assert_eq!(buffer.copy_to(3, &mut out), 0);
    }

    #[test]
    fn test_overwrite_keeps_tail() {
        let buffer = Buffer::new();
        buffer.append(b"hello world");

        buffer.overwrite_at(6, b"W");
        assert_eq!(buffer.to_vec(), b"hello World");
    }

    #[test]
    fn test_overwrite_extends_past_end() {
        let buffer = Buffer::new();
        buffer.append(b"abc");

        buffer.overwrite_at(2, b"XYZ");
        assert_eq!(buffer.to_vec(), b"abXYZ");
    }

    #[test]
    fn test_overwrite_past_end_does_not_zero_fill() {
        let buffer = Buffer::new();
        buffer.append(b"abc");

        buffer.overwrite_at(10, b"de");
        assert_eq!(buffer.to_vec(), b"abcde");
    }

    #[test]
    fn test_replace() {
        let buffer = Buffer::new();
        buffer.append(b"old content");
        buffer.replace(b"new");
        assert_eq!(buffer.to_vec(), b"new");
    }
}
