//! In-memory storage with amortized growth.
//!
//! [`GrowableRegion`] is the memory backend of a [`StagingBuffer`](crate::StagingBuffer). It can
//! also be used on its own: it does not know about modes, so callers that want the write/read
//! guards should go through the facade.
//!
//! # Example
//!
//! ```
//! use stagebuf::region::GrowableRegion;
//! use std::io::SeekFrom;
//!
//! let mut region = GrowableRegion::new();
//! region.write(b"Hello, World!").unwrap();
//! assert_eq!(region.len(), 13);
//!
//! region.seek(SeekFrom::Start(7)).unwrap();
//! let mut out = [0u8; 16];
//! let n = region.read(&mut out).unwrap();
//! assert_eq!(&out[..n], b"World!");
//! ```

use crate::backend::Backend;
use crate::constants::MIN_REGION_CAPACITY;
use crate::error::{Error, Result};
use crate::mode::Mode;
use log::trace;
use std::cmp;
use std::io::SeekFrom;

/// A contiguous, growable byte region with one cursor for both reads and writes.
///
/// # Capacity Management
///
/// Nothing is allocated until the first write. From then on the region grows in amortized steps,
/// see [`next_capacity`](Self::next_capacity) for the exact policy. Growth goes through a fallible
/// reservation, so running out of memory is reported as [`Error::OutOfMemory`] instead of
/// aborting the process.
///
/// # Invariants
///
/// This region maintains the invariant `0 <= self.pos <= self.len <= self.buf.len()` at all
/// times. `self.buf.len()` is the capacity; bytes between `len` and the capacity are zeroed
/// scratch space.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrowableRegion {
    /// Internal storage, always fully initialized up to the capacity.
    buf: Vec<u8>,
    /// Logical length of the stored data.
    len: usize,
    /// Cursor for the next write or read.
    pos: usize,
    /// Capacity to use for the very first allocation, if larger than the growth policy asks for.
    hint: usize,
    /// Bytes accepted over the region's lifetime.
    total_written: u64,
}

impl GrowableRegion {
    /// Creates an empty region. No memory is allocated.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty region whose first allocation is at least `hint` bytes.
    ///
    /// The hint is not allocated up front.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stagebuf::region::GrowableRegion;
    /// let mut region = GrowableRegion::with_capacity_hint(4096);
    /// assert_eq!(region.capacity(), 0);
    ///
    /// region.write(b"x").unwrap();
    /// assert_eq!(region.capacity(), 4096);
    /// ```
    #[inline]
    pub fn with_capacity_hint(hint: usize) -> Self {
        Self {
            hint,
            ..Self::default()
        }
    }

    /// Returns the stored bytes, from the start up to the logical length.
    #[expect(clippy::indexing_slicing, reason = "Safe by invariant")]
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Returns the allocated capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the logical length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the region holds no data.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the cursor position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Computes the capacity needed to fit `required` bytes after a request for `n` more bytes.
    ///
    /// Returns `None` when the region already has room. Otherwise, with `missing` being
    /// `required - capacity`:
    ///
    /// - a region below [`MIN_REGION_CAPACITY`] that misses less than that jumps straight to
    ///   `MIN_REGION_CAPACITY` (or to the hint on the first allocation),
    /// - any other region grows by `max(missing + n / 4, pos / 4)`, so both the incoming write
    ///   and the amount already written push the step size up.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stagebuf::region::GrowableRegion;
    /// let region = GrowableRegion::new();
    /// assert_eq!(region.next_capacity(10, 10).unwrap(), Some(1024));
    /// assert_eq!(region.next_capacity(4000, 4000).unwrap(), Some(4000 + 1000));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the capacity would overflow `usize`.
    pub fn next_capacity(&self, required: usize, n: usize) -> Result<Option<usize>> {
        let cap = self.capacity();
        let Some(missing) = required.checked_sub(cap).filter(|&missing| missing > 0) else {
            return Ok(None);
        };

        let next = if cap < MIN_REGION_CAPACITY && missing < MIN_REGION_CAPACITY {
            cmp::max(MIN_REGION_CAPACITY, required)
        } else {
            let step = cmp::max(missing.saturating_add(n / 4), self.pos / 4);
            cap.checked_add(step).ok_or(Error::OutOfMemory {
                requested: usize::MAX,
            })?
        };

        if cap == 0 {
            return Ok(Some(cmp::max(next, self.hint)));
        }

        Ok(Some(next))
    }

    /// Makes room for `n` more bytes at the cursor and extends the logical length to cover them.
    ///
    /// Existing bytes are preserved across a reallocation. Bytes past the new end of a write that
    /// lands in the middle of the data stay where they are.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the new capacity cannot be allocated.
    pub fn grow(&mut self, n: usize) -> Result<()> {
        let required = self.pos.checked_add(n).ok_or(Error::OutOfMemory {
            requested: usize::MAX,
        })?;

        if let Some(next) = self.next_capacity(required, n)? {
            self.reallocate(next)?;
        }

        self.len = cmp::max(self.len, required);

        Ok(())
    }

    #[expect(clippy::arithmetic_side_effects, reason = "Only ever grows")]
    fn reallocate(&mut self, capacity: usize) -> Result<()> {
        trace!(
            "growing memory region from {} to {} bytes",
            self.capacity(),
            capacity
        );

        self.buf
            .try_reserve_exact(capacity - self.buf.len())
            .map_err(|_| Error::OutOfMemory {
                requested: capacity,
            })?;
        self.buf.resize(capacity, 0);

        Ok(())
    }

    /// Copies `data` in at the cursor, growing as needed, and advances the cursor past it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OutOfMemory`] if the region cannot grow. Nothing is written in that case.
    #[expect(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "Safe after grow"
    )]
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.grow(data.len())?;

        let end = self.pos + data.len();
        self.buf[self.pos..end].copy_from_slice(data);
        self.pos = end;
        self.total_written = self.total_written.saturating_add(data.len() as u64);

        Ok(data.len())
    }

    /// Copies up to `out.len()` bytes from the cursor and advances it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndOfStream`] when the cursor is at the end and `out` is not empty.
    /// An empty `out` at the end reads `Ok(0)`.
    #[expect(
        clippy::arithmetic_side_effects,
        clippy::indexing_slicing,
        reason = "Safe by invariant"
    )]
    pub fn read(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.pos >= self.len {
            debug_assert!(self.pos == self.len);

            if out.is_empty() {
                return Ok(0);
            }
            return Err(Error::EndOfStream);
        }

        let n = cmp::min(self.len - self.pos, out.len());
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;

        Ok(n)
    }

    /// Moves the cursor. The target must lie within `[0, len]`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stagebuf::region::GrowableRegion;
    /// # use std::io::SeekFrom;
    /// let mut region = GrowableRegion::new();
    /// region.write(b"0123456789").unwrap();
    ///
    /// assert_eq!(region.seek(SeekFrom::End(-4)).unwrap(), 6);
    /// assert_eq!(region.seek(SeekFrom::Current(-6)).unwrap(), 0);
    /// assert!(region.seek(SeekFrom::Start(11)).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::SeekOutOfRange`] for targets before the start or past the end. The cursor
    /// does not move in that case.
    #[expect(clippy::arithmetic_side_effects, reason = "i128 cannot overflow here")]
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let offset = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => self.pos as i128 + i128::from(delta),
            SeekFrom::End(delta) => self.len as i128 + i128::from(delta),
        };

        let target = usize::try_from(offset)
            .ok()
            .filter(|&target| target <= self.len)
            .ok_or(Error::SeekOutOfRange { offset })?;
        self.pos = target;

        Ok(target as u64)
    }

    /// Shortens the data to `size` bytes.
    ///
    /// Truncating to zero also rewinds the cursor so the space is reused by the next write;
    /// otherwise the cursor is only pulled back if it was past the new end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncateOutOfRange`] if `size` exceeds the current length.
    pub fn truncate(&mut self, size: u64) -> Result<()> {
        let new_len = usize::try_from(size)
            .ok()
            .filter(|&new_len| new_len <= self.len)
            .ok_or(Error::TruncateOutOfRange {
                requested: size,
                size: self.len as u64,
            })?;

        self.len = new_len;
        self.pos = cmp::min(self.pos, new_len);

        Ok(())
    }

    /// Returns the number of bytes ever written, regardless of truncation.
    #[inline]
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Releases the storage and resets the cursor. The lifetime counter is kept.
    pub fn release(&mut self) {
        self.buf = Vec::new();
        self.len = 0;
        self.pos = 0;
    }
}

impl Backend for GrowableRegion {
    fn enter(&mut self, _mode: Mode) -> Result<()> {
        // Reads and writes share the cursor, there is nothing to swap.
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        GrowableRegion::write(self, data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        GrowableRegion::read(self, buf)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        GrowableRegion::seek(self, pos)
    }

    fn truncate(&mut self, size: u64) -> Result<()> {
        GrowableRegion::truncate(self, size)
    }

    fn size(&self) -> Result<u64> {
        Ok(self.len as u64)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.release();
        Ok(())
    }

    fn total_written(&self) -> u64 {
        self.total_written
    }

    fn offset(&self) -> Option<u64> {
        Some(self.pos as u64)
    }
}

#[cfg(test)]
mod tests;
