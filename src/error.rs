//! Error type shared by every operation of the crate.
//!
//! All failures are returned to the immediate caller. Nothing is retried and nothing is dropped,
//! with one exception: [`StagingBuffer::close`](crate::StagingBuffer::close) still releases its
//! resources when it reports a failure.

use crate::mode::Mode;
use std::fmt;
use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The file system operation an [`Error::Io`] or [`Error::Close`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    /// Creating the spill file.
    Create,
    /// Reading through the buffered reader.
    Read,
    /// Writing through the buffered writer.
    Write,
    /// Flushing the buffered writer.
    Flush,
    /// Seeking the spill file.
    Seek,
    /// Truncating the spill file.
    Truncate,
    /// Querying the spill file size.
    Stat,
    /// Deleting the spill file on close.
    Remove,
    /// Keeping the spill file on close.
    Persist,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Write => "write",
            Self::Flush => "flush",
            Self::Seek => "seek",
            Self::Truncate => "truncate",
            Self::Stat => "stat",
            Self::Remove => "remove",
            Self::Persist => "persist",
        };
        f.write_str(name)
    }
}

/// Errors reported by a [`StagingBuffer`](crate::StagingBuffer).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation was invoked in the wrong mode. Modes are never switched implicitly.
    #[error("stagebuf: not in {expected} mode (current mode: {actual})")]
    ModeMismatch { expected: Mode, actual: Mode },

    /// The memory region could not obtain the capacity it needed to grow.
    #[error("stagebuf: out of free memory (requested capacity of {requested} bytes)")]
    OutOfMemory { requested: usize },

    /// A seek would have landed outside `[0, size]`.
    #[error("stagebuf: seek to {offset} is out of range")]
    SeekOutOfRange { offset: i128 },

    /// A truncate asked for more bytes than the buffer holds.
    #[error("stagebuf: truncation to {requested} out of range (size is {size})")]
    TruncateOutOfRange { requested: u64, size: u64 },

    /// A raw seek origin other than 0 (start), 1 (current) or 2 (end).
    #[error("stagebuf: whence = {0} not supported")]
    UnsupportedWhence(i32),

    /// A non-empty read found no bytes left.
    #[error("stagebuf: end of stream")]
    EndOfStream,

    /// The buffer was closed and can no longer switch modes.
    #[error("stagebuf: buffer is closed")]
    Closed,

    /// A file system call on the spill file failed.
    #[error("stagebuf: spill file {op} failed: {source}")]
    Io {
        op: IoOp,
        #[source]
        source: io::Error,
    },

    /// Finalising the spill file on close failed, possibly after a failed flush.
    #[error("stagebuf: spill file {op} on close failed: {source}, flush state: {}", flush_state(.flush))]
    Close {
        op: IoOp,
        #[source]
        source: io::Error,
        flush: Option<Box<Error>>,
    },
}

fn flush_state(flush: &Option<Box<Error>>) -> String {
    match flush {
        Some(err) => err.to_string(),
        None => String::from("ok"),
    }
}

impl Error {
    /// Wraps an I/O error with the operation it came from.
    pub(crate) fn io(op: IoOp) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io { op, source }
    }

    /// Returns `true` for [`Error::EndOfStream`].
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    fn kind(&self) -> io::ErrorKind {
        match self {
            Self::ModeMismatch { .. } | Self::Closed => io::ErrorKind::Unsupported,
            Self::OutOfMemory { .. } => io::ErrorKind::OutOfMemory,
            Self::SeekOutOfRange { .. }
            | Self::TruncateOutOfRange { .. }
            | Self::UnsupportedWhence(_) => io::ErrorKind::InvalidInput,
            Self::EndOfStream => io::ErrorKind::UnexpectedEof,
            Self::Io { source, .. } | Self::Close { source, .. } => source.kind(),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io { source, .. } => source,
            other => io::Error::new(other.kind(), other),
        }
    }
}
