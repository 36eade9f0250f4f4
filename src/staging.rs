//! The public staging buffer.

use crate::backend::Backend;
use crate::constants::DEFAULT_BUFFER_SIZE;
use crate::error::{Error, Result};
use crate::mode::{Mode, ModeController};
use crate::region::GrowableRegion;
use crate::spill::SpillFile;
use std::io::{self, SeekFrom};
use std::path::Path;

/// A write-then-read buffer backed by memory or by a temporary spill file.
///
/// The backend is chosen at construction and never changes. Callers switch to write mode,
/// write, switch to read mode and read the same bytes back, with seeks and truncations in
/// between. Both backends behave the same; the only visible difference is that the file backend
/// reports its size from disk, so unflushed bytes are not counted until [`flush`](Self::flush).
///
/// A `StagingBuffer` has a single owner and does no locking.
///
/// # Examples
///
/// ```
/// use stagebuf::StagingBuffer;
/// use std::io::SeekFrom;
///
/// let mut buf = StagingBuffer::new(100, true, false);
/// buf.switch_to_write().unwrap();
/// buf.write_str("123456789").unwrap();
/// buf.write(b"0").unwrap();
/// buf.flush().unwrap();
///
/// buf.switch_to_read().unwrap();
/// assert_eq!(buf.seek(SeekFrom::Start(0)).unwrap(), 0);
///
/// let mut out = [0u8; 200];
/// let n = buf.read(&mut out).unwrap();
/// assert_eq!(&out[..n], b"1234567890");
///
/// assert_eq!(buf.seek(SeekFrom::End(0)).unwrap(), 10);
/// buf.close().unwrap();
/// ```
#[derive(Debug)]
pub struct StagingBuffer {
    mode: ModeController,
    backend: Box<dyn Backend>,
    memory: bool,
}

impl StagingBuffer {
    /// Creates a staging buffer. Nothing is allocated and no file is created.
    ///
    /// - `buffer_size` is the chunk size of the buffered layers over the spill file, and the
    ///   initial capacity hint of the memory region.
    /// - `use_memory` selects the memory backend instead of a spill file.
    /// - `remove_after_close` deletes the spill file on close. Ignored in memory mode.
    pub fn new(buffer_size: usize, use_memory: bool, remove_after_close: bool) -> Self {
        Self::builder()
            .buffer_size(buffer_size)
            .memory(use_memory)
            .remove_after_close(remove_after_close)
            .build()
    }

    /// Returns a [`StagingBufferBuilder`] for configuring a new `StagingBuffer`.
    pub fn builder() -> StagingBufferBuilder {
        StagingBufferBuilder::default()
    }

    /// Returns the current mode.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode.current()
    }

    /// Returns `true` if the buffer keeps its data in memory.
    #[inline]
    pub fn is_memory(&self) -> bool {
        self.memory
    }

    /// Returns `true` once a file buffer was [closed](Self::close). Memory buffers never are.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.mode.is_closed()
    }

    fn switch(&mut self, target: Mode) -> Result<()> {
        if !self.mode.begin_switch(target)? {
            return Ok(());
        }

        self.backend.enter(target)?;
        self.mode.finish_switch(target);

        Ok(())
    }

    /// Enters write mode. A no-op when already writing.
    ///
    /// The file backend creates its spill file here on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] after a file buffer was [closed](Self::close), or an I/O error
    /// if the spill file cannot be created or repositioned.
    pub fn switch_to_write(&mut self) -> Result<()> {
        self.switch(Mode::Write)
    }

    /// Enters read mode. A no-op when already reading.
    ///
    /// Pending writes are flushed first. Reading continues from the current position, so callers
    /// usually [`seek`](Self::seek) back to the start afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] after a file buffer was [closed](Self::close), or an I/O error
    /// if the flush fails or the spill file cannot be created.
    pub fn switch_to_read(&mut self) -> Result<()> {
        self.switch(Mode::Read)
    }

    /// Writes all of `data` at the current position and returns its length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModeMismatch`] outside write mode, [`Error::OutOfMemory`] if the memory
    /// region cannot grow, or an I/O error from the spill file (including a failed automatic
    /// flush).
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.mode.guard(Mode::Write)?;
        self.backend.write(data)
    }

    /// Writes the bytes of `s`. See [`write`](Self::write).
    ///
    /// # Errors
    ///
    /// Same as [`write`](Self::write).
    pub fn write_str(&mut self, s: &str) -> Result<usize> {
        self.write(s.as_bytes())
    }

    /// Reads up to `buf.len()` bytes from the current position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModeMismatch`] outside read mode and [`Error::EndOfStream`] when nothing
    /// is left to read (an empty `buf` reads `Ok(0)` instead).
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.mode.guard(Mode::Read)?;
        self.backend.read(buf)
    }

    /// Moves the current position and returns the new absolute offset.
    ///
    /// The file backend flushes pending writes before seeking.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SeekOutOfRange`] if a memory buffer would land outside `[0, size]`, or an
    /// I/O error from the spill file.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.backend.seek(pos)
    }

    /// Seeks with a raw origin: `0` from the start, `1` from the current position, `2` from the
    /// end.
    ///
    /// # Examples
    ///
    /// ```
    /// # use stagebuf::{Error, StagingBuffer};
    /// let mut buf = StagingBuffer::new(64, true, true);
    /// buf.switch_to_write().unwrap();
    /// buf.write(b"abcdef").unwrap();
    ///
    /// assert_eq!(buf.seek_raw(-2, 2).unwrap(), 4);
    /// assert!(matches!(buf.seek_raw(0, 3), Err(Error::UnsupportedWhence(3))));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedWhence`] for any other origin, otherwise as
    /// [`seek`](Self::seek). A negative offset from the start is out of range.
    pub fn seek_raw(&mut self, offset: i64, whence: i32) -> Result<u64> {
        let pos = match whence {
            0 => SeekFrom::Start(
                u64::try_from(offset).map_err(|_| Error::SeekOutOfRange {
                    offset: i128::from(offset),
                })?,
            ),
            1 => SeekFrom::Current(offset),
            2 => SeekFrom::End(offset),
            other => return Err(Error::UnsupportedWhence(other)),
        };

        self.seek(pos)
    }

    /// Shortens the buffer to `size` bytes.
    ///
    /// Truncating to zero in memory mode also rewinds the position; otherwise the position is
    /// only pulled back when it was past the new end.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncateOutOfRange`] if `size` is larger than the buffer, or an I/O error
    /// from the spill file.
    pub fn truncate(&mut self, size: u64) -> Result<()> {
        self.backend.truncate(size)
    }

    /// Returns the size of the buffer in bytes.
    ///
    /// For the file backend this is the on-disk size: bytes still sitting in the write buffer
    /// are only counted after a [`flush`](Self::flush). A spill file that was never created has
    /// size zero.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the spill file cannot be queried.
    pub fn size(&self) -> Result<u64> {
        self.backend.size()
    }

    /// Returns `true` if [`size`](Self::size) is zero.
    ///
    /// # Errors
    ///
    /// Same as [`size`](Self::size).
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.size()? == 0)
    }

    /// Persists pending writes. A no-op outside write mode.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the spill file write fails.
    pub fn flush(&mut self) -> Result<()> {
        if self.mode.current() != Mode::Write {
            return Ok(());
        }

        self.backend.flush()
    }

    /// Returns the cursor of a memory buffer, or `None` for a file buffer.
    #[inline]
    pub fn offset(&self) -> Option<u64> {
        self.backend.offset()
    }

    /// Returns the number of bytes accepted over the buffer's lifetime.
    ///
    /// Truncation, seeking and closing never lower it.
    #[inline]
    pub fn total_written(&self) -> u64 {
        self.backend.total_written()
    }

    /// Returns the path of the spill file.
    ///
    /// `None` in memory mode, before the file was created, and after a close that removed it.
    /// After a close without removal this is where the file was left.
    #[inline]
    pub fn spill_path(&self) -> Option<&Path> {
        self.backend.spill_path()
    }

    /// Releases every resource and leaves the buffer in [`Mode::None`].
    ///
    /// A memory buffer is only emptied and can be switched into a mode again. A file buffer is
    /// done for good: pending writes are flushed, the spill file is deleted if the buffer was
    /// built with `remove_after_close`, and later mode switches fail with [`Error::Closed`].
    /// Calling `close` again does nothing.
    ///
    /// # Errors
    ///
    /// Returns the flush failure, or an [`Error::Close`] carrying both the removal failure and
    /// any flush failure. Resources are released in every case.
    pub fn close(&mut self) -> Result<()> {
        let result = self.backend.close();
        if self.memory {
            self.mode.reset();
        } else {
            self.mode.close();
        }
        result
    }
}

impl io::Read for StagingBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match StagingBuffer::read(self, buf) {
            Err(Error::EndOfStream) => Ok(0),
            result => result.map_err(io::Error::from),
        }
    }
}

impl io::Write for StagingBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        StagingBuffer::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        StagingBuffer::flush(self).map_err(io::Error::from)
    }
}

impl io::Seek for StagingBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        StagingBuffer::seek(self, pos).map_err(io::Error::from)
    }
}

/// A builder for constructing a [`StagingBuffer`].
///
/// Defaults: [`DEFAULT_BUFFER_SIZE`], the file backend, removal on close, no auto-flush.
#[must_use]
#[derive(Debug, Clone)]
pub struct StagingBufferBuilder {
    buffer_size: usize,
    memory: bool,
    remove_after_close: bool,
    flush_after: Option<u64>,
}

impl Default for StagingBufferBuilder {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            memory: false,
            remove_after_close: true,
            flush_after: None,
        }
    }
}

impl StagingBufferBuilder {
    /// Sets the buffered chunk size of the spill file and the capacity hint of the memory region.
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Selects the memory backend (`true`) or the spill file backend (`false`).
    pub fn memory(mut self, memory: bool) -> Self {
        self.memory = memory;
        self
    }

    /// Deletes the spill file on close. Ignored by the memory backend.
    pub fn remove_after_close(mut self, remove: bool) -> Self {
        self.remove_after_close = remove;
        self
    }

    /// Flushes the spill file automatically once `bytes` unflushed bytes have been written.
    ///
    /// `0` disables it. Ignored by the memory backend, which has nothing to flush.
    pub fn flush_after(mut self, bytes: u64) -> Self {
        self.flush_after = Some(bytes);
        self
    }

    /// Builds the [`StagingBuffer`]. This does not allocate or touch the file system.
    pub fn build(self) -> StagingBuffer {
        let backend: Box<dyn Backend> = if self.memory {
            Box::new(GrowableRegion::with_capacity_hint(self.buffer_size))
        } else {
            let mut spill = SpillFile::new(self.buffer_size, self.remove_after_close);
            spill.set_flush_after(self.flush_after.unwrap_or(0));
            Box::new(spill)
        };

        StagingBuffer {
            mode: ModeController::new(),
            backend,
            memory: self.memory,
        }
    }
}
