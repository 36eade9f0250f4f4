//! Stream transforms in front of a staging buffer.
//!
//! Input often needs processing (decompression, decoding) before it is worth staging.
//! [`TransformReader`] wraps a raw source in a buffered reader, hands it to a processing
//! function, and buffers whatever stream the function returns. The processed stream owns the raw
//! source, so dropping or [closing](TransformReader::close) the transform releases both.
//!
//! # Example
//!
//! ```
//! use stagebuf::StagingBuffer;
//! use stagebuf::transform::{passthrough, TransformReader};
//! use std::io;
//!
//! let source = &b"raw input"[..];
//! let mut input = TransformReader::new(source, 4096, passthrough).unwrap();
//!
//! let mut buf = StagingBuffer::new(4096, true, true);
//! buf.switch_to_write().unwrap();
//! io::copy(&mut input, &mut buf).unwrap();
//! input.close();
//!
//! assert_eq!(buf.size().unwrap(), 9);
//! ```

use std::io::{self, BufRead, BufReader, Read};

/// A buffered reader over the output of a processing function.
#[derive(Debug)]
pub struct TransformReader<T> {
    inner: BufReader<T>,
}

impl<T: Read> TransformReader<T> {
    /// Wraps `source` with `buffer_size` bytes of buffering and passes it to `processor`.
    ///
    /// # Errors
    ///
    /// Returns whatever error `processor` returns. The source is dropped in that case.
    pub fn new<R, F>(source: R, buffer_size: usize, processor: F) -> io::Result<Self>
    where
        R: Read,
        F: FnOnce(BufReader<R>) -> io::Result<T>,
    {
        let raw = BufReader::with_capacity(buffer_size, source);
        let processed = processor(raw)?;

        Ok(Self {
            inner: BufReader::with_capacity(buffer_size, processed),
        })
    }

    /// Returns a reference to the processed stream.
    pub fn get_ref(&self) -> &T {
        self.inner.get_ref()
    }

    /// Unwraps the processed stream. Buffered but unread data is lost.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }

    /// Releases the processed stream and the raw source under it.
    pub fn close(self) {}
}

impl<T: Read> Read for TransformReader<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<T: Read> BufRead for TransformReader<T> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.inner.consume(amt);
    }
}

/// The identity processor: the raw (buffered) source is the processed stream.
pub fn passthrough<R: Read>(raw: R) -> io::Result<R> {
    Ok(raw)
}

#[cfg(test)]
mod tests;
