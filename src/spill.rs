//! Temporary-file storage with buffered layers.
//!
//! [`SpillFile`] is the file backend of a [`StagingBuffer`](crate::StagingBuffer). The file is an
//! anonymous temp file in the host temp directory, named with the
//! [`SPILL_PREFIX`](crate::constants::SPILL_PREFIX) prefix, and it is only created the first time
//! it is really needed.
//!
//! At most one buffered layer sits on top of the file at a time: a [`BufWriter`] in write mode, a
//! [`BufReader`] in read mode, or the bare handle otherwise. Every raw operation (seek, truncate,
//! mode switch) detaches the layer first and attaches a fresh one afterwards, so no layer ever
//! holds stale data across it.

use crate::backend::Backend;
use crate::constants::SPILL_PREFIX;
use crate::error::{Error, IoOp, Result};
use crate::mode::Mode;
use log::{debug, warn};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::mem;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

/// What currently sits on top of the file handle.
#[derive(Debug, Default)]
enum Layer {
    /// No file yet, or the file was closed.
    #[default]
    Detached,
    /// The file exists but no mode is active.
    Raw(File),
    /// Read mode.
    Reading(BufReader<File>),
    /// Write mode.
    Writing(BufWriter<File>),
}

impl Layer {
    fn mode(&self) -> Mode {
        match self {
            Self::Detached | Self::Raw(_) => Mode::None,
            Self::Reading(_) => Mode::Read,
            Self::Writing(_) => Mode::Write,
        }
    }

    fn file(&self) -> Option<&File> {
        match self {
            Self::Detached => None,
            Self::Raw(file) => Some(file),
            Self::Reading(reader) => Some(reader.get_ref()),
            Self::Writing(writer) => Some(writer.get_ref()),
        }
    }
}

/// A lazily created temporary file with a buffered reader or writer on top.
#[derive(Debug)]
pub struct SpillFile {
    layer: Layer,
    /// Owns the file name while the file is open. Dropping it deletes the file, unless the
    /// spill file is dropped without `remove_after_close`.
    path: Option<TempPath>,
    /// Where the file was left behind by a close without removal.
    kept: Option<PathBuf>,
    buffer_size: usize,
    flush_after: u64,
    remove_after_close: bool,
    unflushed: u64,
    total_written: u64,
    closed: bool,
}

impl SpillFile {
    /// Creates a spill file description. Nothing touches the file system until it is needed.
    ///
    /// `buffer_size` is the capacity of the buffered reader and writer. With
    /// `remove_after_close` the file is deleted on [`close`](Backend::close), otherwise it is
    /// kept and its path stays available through [`spill_path`](Backend::spill_path).
    pub fn new(buffer_size: usize, remove_after_close: bool) -> Self {
        Self {
            layer: Layer::Detached,
            path: None,
            kept: None,
            buffer_size,
            flush_after: 0,
            remove_after_close,
            unflushed: 0,
            total_written: 0,
            closed: false,
        }
    }

    /// Flushes automatically once `bytes` unflushed bytes have piled up. `0` disables it.
    pub fn set_flush_after(&mut self, bytes: u64) {
        self.flush_after = bytes;
    }

    /// Returns the auto-flush threshold, `0` when disabled.
    #[inline]
    pub fn flush_after(&self) -> u64 {
        self.flush_after
    }

    /// Returns the number of bytes written since the last flush.
    #[inline]
    pub fn unflushed(&self) -> u64 {
        self.unflushed
    }

    /// Returns the mode of the layer currently attached.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.layer.mode()
    }

    /// Returns `true` once the file was created and not yet closed.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.layer.file().is_some()
    }

    fn create(&mut self) -> Result<File> {
        if self.closed {
            return Err(Error::Closed);
        }

        let (file, path) = tempfile::Builder::new()
            .prefix(SPILL_PREFIX)
            .tempfile()
            .map_err(Error::io(IoOp::Create))?
            .into_parts();
        debug!("created spill file {}", path.display());
        self.path = Some(path);

        Ok(file)
    }

    /// Takes the bare handle out of whatever layer holds it.
    ///
    /// Pending writes are flushed first and a reader's read-ahead is given back, so the OS
    /// position of the returned handle is the logical position of the layer.
    fn detach(&mut self) -> Result<Option<File>> {
        self.flush()?;
        if let Layer::Reading(reader) = &mut self.layer {
            // Seeking through the reader drops its buffer and rewinds the handle.
            reader
                .seek(SeekFrom::Current(0))
                .map_err(Error::io(IoOp::Seek))?;
        }

        Ok(match mem::take(&mut self.layer) {
            Layer::Detached => None,
            Layer::Raw(file) => Some(file),
            Layer::Reading(reader) => Some(reader.into_inner()),
            // Flushed above, the buffer is empty.
            Layer::Writing(writer) => Some(writer.into_parts().0),
        })
    }

    /// Like [`detach`](Self::detach), creating the file if there is none yet.
    fn take_file(&mut self) -> Result<File> {
        match self.detach()? {
            Some(file) => Ok(file),
            None => self.create(),
        }
    }

    fn attach(&mut self, file: File, mode: Mode) {
        self.layer = match mode {
            Mode::None => Layer::Raw(file),
            Mode::Read => Layer::Reading(BufReader::with_capacity(self.buffer_size, file)),
            Mode::Write => Layer::Writing(BufWriter::with_capacity(self.buffer_size, file)),
        };
    }

    /// Finalises the file name on close: delete it or leave it behind.
    fn finish(&mut self, path: TempPath) -> std::result::Result<(), (IoOp, std::io::Error)> {
        if self.remove_after_close {
            let display = path.display().to_string();
            path.close().map_err(|err| (IoOp::Remove, err))?;
            debug!("removed spill file {display}");
            return Ok(());
        }

        let kept = path.keep().map_err(|err| (IoOp::Persist, err.error))?;
        debug!("kept spill file {}", kept.display());
        self.kept = Some(kept);

        Ok(())
    }
}

impl Drop for SpillFile {
    fn drop(&mut self) {
        // Without a close only `remove_after_close` may delete the file.
        if self.remove_after_close {
            return;
        }
        if let Some(path) = self.path.take() {
            match path.keep() {
                Ok(kept) => debug!("dropped spill file left at {}", kept.display()),
                Err(err) => warn!("keeping dropped spill file failed: {}", err.error),
            }
        }
    }
}

fn truncate_file(file: &mut File, size: u64) -> Result<()> {
    let current = file.metadata().map_err(Error::io(IoOp::Stat))?.len();
    if size > current {
        return Err(Error::TruncateOutOfRange {
            requested: size,
            size: current,
        });
    }

    file.set_len(size).map_err(Error::io(IoOp::Truncate))?;

    // Keep the position inside the file, like the memory region does.
    let pos = file.stream_position().map_err(Error::io(IoOp::Seek))?;
    if pos > size {
        file.seek(SeekFrom::Start(size))
            .map_err(Error::io(IoOp::Seek))?;
    }

    Ok(())
}

/// Folds the flush failure and the finalisation failure of a close into one result.
fn close_result(
    flush: Option<Error>,
    finished: std::result::Result<(), (IoOp, std::io::Error)>,
) -> Result<()> {
    match finished {
        Ok(()) => flush.map_or(Ok(()), Err),
        Err((op, source)) => {
            warn!("closing spill file failed during {op}: {source}");
            Err(Error::Close {
                op,
                source,
                flush: flush.map(Box::new),
            })
        }
    }
}

impl Backend for SpillFile {
    fn enter(&mut self, mode: Mode) -> Result<()> {
        if self.layer.mode() == mode && self.is_open() {
            return Ok(());
        }

        let file = self.take_file()?;
        self.attach(file, mode);

        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let actual = self.layer.mode();
        let Layer::Writing(writer) = &mut self.layer else {
            return Err(Error::ModeMismatch {
                expected: Mode::Write,
                actual,
            });
        };

        writer.write_all(data).map_err(Error::io(IoOp::Write))?;

        let n = data.len() as u64;
        self.unflushed = self.unflushed.saturating_add(n);
        self.total_written = self.total_written.saturating_add(n);

        if self.flush_after > 0 && self.unflushed >= self.flush_after {
            debug!(
                "spill file reached {} unflushed bytes, flushing",
                self.unflushed
            );
            self.flush()?;
        }

        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let actual = self.layer.mode();
        let Layer::Reading(reader) = &mut self.layer else {
            return Err(Error::ModeMismatch {
                expected: Mode::Read,
                actual,
            });
        };

        let n = reader.read(buf).map_err(Error::io(IoOp::Read))?;
        if n == 0 && !buf.is_empty() {
            return Err(Error::EndOfStream);
        }

        Ok(n)
    }

    fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        let mode = self.layer.mode();
        let mut file = self.take_file()?;

        let result = file.seek(pos).map_err(Error::io(IoOp::Seek));
        self.attach(file, mode);

        result
    }

    fn truncate(&mut self, size: u64) -> Result<()> {
        let mode = self.layer.mode();
        let mut file = self.take_file()?;

        let result = truncate_file(&mut file, size);
        self.attach(file, mode);

        if result.is_ok() {
            debug!("truncated spill file to {size} bytes");
        }
        result
    }

    fn size(&self) -> Result<u64> {
        let Some(file) = self.layer.file() else {
            return Ok(0);
        };

        Ok(file.metadata().map_err(Error::io(IoOp::Stat))?.len())
    }

    fn flush(&mut self) -> Result<()> {
        let Layer::Writing(writer) = &mut self.layer else {
            return Ok(());
        };

        writer.flush().map_err(Error::io(IoOp::Flush))?;
        self.unflushed = 0;

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let flush = self.flush().err();

        // Drop the handle without another flush attempt; a failed flush stays reported.
        if let Layer::Writing(writer) = mem::take(&mut self.layer) {
            drop(writer.into_parts());
        }
        self.unflushed = 0;
        self.closed = true;

        let finished = match self.path.take() {
            Some(path) => self.finish(path),
            None => Ok(()),
        };

        close_result(flush, finished)
    }

    fn total_written(&self) -> u64 {
        self.total_written
    }

    fn spill_path(&self) -> Option<&Path> {
        self.path.as_deref().or(self.kept.as_deref())
    }
}
