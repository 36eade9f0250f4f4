//! The storage interface behind a [`StagingBuffer`](crate::StagingBuffer).
//!
//! A staging buffer picks exactly one backend when it is built and keeps it for its whole
//! lifetime. Both backends implement [`Backend`], so the facade never branches on which one is
//! active.
//!
//! - [`GrowableRegion`](crate::region::GrowableRegion) keeps everything in memory.
//! - [`SpillFile`](crate::spill::SpillFile) writes through a buffered layer into a temporary file.
//!
//! Backends do not enforce the mode guards, the facade does that before delegating. They only
//! learn about a mode through [`Backend::enter`].

use crate::error::Result;
use crate::mode::Mode;
use std::fmt;
use std::io::SeekFrom;
use std::path::Path;

/// Storage strategy of a staging buffer.
pub trait Backend: fmt::Debug {
    /// Prepares the backend for `mode`.
    ///
    /// Called by the facade on every real mode switch. Memory storage has nothing to do here;
    /// file storage swaps its buffered reader and writer and creates the file on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if pending writes cannot be flushed or the file cannot be created.
    fn enter(&mut self, mode: Mode) -> Result<()>;

    /// Appends or overwrites `data` at the current position and returns `data.len()`.
    ///
    /// Either all bytes are accepted or the call fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot take the bytes.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Reads up to `buf.len()` bytes from the current position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndOfStream`](crate::Error::EndOfStream) if nothing is left and `buf` is
    /// not empty, or an I/O error from the storage.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Moves the current position and returns the new absolute offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the target offset is invalid for this storage.
    fn seek(&mut self, pos: SeekFrom) -> Result<u64>;

    /// Shortens the stored data to `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncateOutOfRange`](crate::Error::TruncateOutOfRange) if `size` is larger
    /// than the stored data.
    fn truncate(&mut self, size: u64) -> Result<()>;

    /// Returns the number of bytes stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be queried.
    fn size(&self) -> Result<u64>;

    /// Persists pending writes. A no-op unless the backend is in write mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the pending writes cannot be persisted.
    fn flush(&mut self) -> Result<()>;

    /// Releases every resource the backend holds. Calling it again is harmless.
    ///
    /// # Errors
    ///
    /// Returns the failures met while releasing; the resources are released regardless.
    fn close(&mut self) -> Result<()>;

    /// Returns the total number of bytes ever accepted by [`write`](Self::write).
    fn total_written(&self) -> u64;

    /// Returns the current position, where the backend can report it without I/O.
    fn offset(&self) -> Option<u64> {
        None
    }

    /// Returns the path of the backing file, if there is one.
    fn spill_path(&self) -> Option<&Path> {
        None
    }
}
