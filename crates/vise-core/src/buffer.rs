//! Growable owned byte storage with explicit capacity management
//!
//! Streams that accumulate input and the adaptive decompress path both need
//! a buffer whose growth and allocation failures are visible, rather than a
//! bare `Vec` that aborts on exhaustion.

use vise_types::{Error, Result};

/// Owned contiguous byte storage.
///
/// Capacity grows geometrically: an [`append`](ByteBuffer::append) that
/// overflows the current capacity reserves the next power of two at or
/// above the required size. Allocation failures surface as
/// [`Error::Memory`] instead of aborting.
#[derive(Debug, Default)]
pub struct ByteBuffer {
    data: Vec<u8>,
}

impl ByteBuffer {
    /// Create a new, empty buffer with no allocation.
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Create a zero-filled buffer of `size` bytes.
    pub fn with_size(size: usize) -> Result<Self> {
        let mut buf = Self::new();
        buf.resize(size)?;
        Ok(buf)
    }

    /// Number of bytes currently stored.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current allocated capacity.
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Append `bytes`, growing capacity to the next power of two when needed.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve_for(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Grow the buffer to `size` bytes, zero-filling the tail.
    pub fn resize(&mut self, size: usize) -> Result<()> {
        if size > self.data.len() {
            self.reserve_for(size - self.data.len())?;
        }
        self.data.resize(size, 0);
        Ok(())
    }

    /// Shrink the stored length to `size`. Growing through this call is an
    /// error; use [`resize`](ByteBuffer::resize) instead.
    pub fn set_len(&mut self, size: usize) -> Result<()> {
        if size > self.data.len() {
            return Err(Error::range(format!(
                "cannot grow buffer from {} to {} bytes via set_len",
                self.data.len(),
                size
            )));
        }
        self.data.truncate(size);
        Ok(())
    }

    /// Discard all stored bytes, keeping the allocation.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Transfer the storage out, leaving the buffer empty.
    pub fn steal(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    /// View the stored bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Mutably view the stored bytes.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn reserve_for(&mut self, additional: usize) -> Result<()> {
        let required = self
            .data
            .len()
            .checked_add(additional)
            .ok_or_else(|| Error::range("buffer size overflows usize"))?;
        if required <= self.data.capacity() {
            return Ok(());
        }
        let target = required.checked_next_power_of_two().unwrap_or(required);
        self.data
            .try_reserve_exact(target - self.data.len())
            .map_err(|_| Error::Memory)
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}
