//! A write-then-read staging buffer backed by memory or by a temporary spill file.
//!
//! Producers often need somewhere to put a stream of bytes before it can be consumed: a download
//! that has to be complete before parsing, a decompressed payload that is read twice, a body of
//! unknown size. [`StagingBuffer`] gives that somewhere one interface and two backends:
//!
//! - **memory**: a growable region, fastest, bounded by RAM.
//! - **spill file**: a temp file in the host temp directory with buffered I/O on top, for
//!   payloads too large to keep in memory comfortably.
//!
//! The backend is picked once at construction. Write, read, seek and truncate behave the same for
//! both.
//!
//! # Quick start
//!
//! ```
//! use stagebuf::StagingBuffer;
//! use std::io::SeekFrom;
//!
//! // File backend, removed again on close
//! let mut buf = StagingBuffer::new(8 * 1024, false, true);
//!
//! buf.switch_to_write().unwrap();
//! buf.write(b"Hello, ").unwrap();
//! buf.write_str("World!").unwrap();
//!
//! // Switching to read flushes; reading continues from the current position
//! buf.switch_to_read().unwrap();
//! buf.seek(SeekFrom::Start(0)).unwrap();
//!
//! let mut out = [0u8; 32];
//! let n = buf.read(&mut out).unwrap();
//! assert_eq!(&out[..n], b"Hello, World!");
//!
//! buf.close().unwrap();
//! ```
//!
//! # Configuration
//!
//! ```
//! use stagebuf::StagingBuffer;
//!
//! let buf = StagingBuffer::builder()
//!     .buffer_size(64 * 1024)      // 64 KiB buffered layers
//!     .flush_after(1024 * 1024)    // flush every 1 MiB written
//!     .remove_after_close(false)   // leave the file behind for someone else
//!     .build();
//! ```
//!
//! # Crate organisation
//!
//! - [`StagingBuffer`] — the primary type, with the mode guards and the public operations.
//! - [`StagingBufferBuilder`] — configures backend, chunk size, removal and auto-flush.
//! - [`Mode`] — the write/read state a buffer is in.
//! - [`Backend`] — the interface both storage strategies implement.
//! - [`region::GrowableRegion`] — the memory backend, usable on its own.
//! - [`spill::SpillFile`] — the spill file backend.
//! - [`transform`] — wrapping a raw source in a processing stream before staging it.
//! - [`constants`] — default sizes and the spill file name prefix.
//! - [`Error`] — every failure the crate reports.

pub mod backend;
pub mod constants;
mod error;
mod mode;
pub mod region;
pub mod spill;
mod staging;
pub mod transform;

pub use backend::Backend;
pub use error::{Error, IoOp, Result};
pub use mode::Mode;
pub use staging::{StagingBuffer, StagingBufferBuilder};
