//! Tests for the TransformReader

#![expect(clippy::unwrap_used, reason = "Okay in tests")]

use super::*;
use crate::StagingBuffer;
use std::cell::Cell;
use std::io::{Cursor, SeekFrom};
use std::rc::Rc;

/// Flips every bit of the wrapped stream.
#[derive(Debug)]
struct Invert<R>(R);

impl<R: Read> Read for Invert<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.0.read(buf)?;
        buf.iter_mut().take(n).for_each(|b| *b = !*b);
        Ok(n)
    }
}

/// A source that records when it is dropped.
struct Tracked {
    data: Cursor<Vec<u8>>,
    dropped: Rc<Cell<bool>>,
}

impl Read for Tracked {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.dropped.set(true);
    }
}

#[test]
fn test_passthrough() {
    let mut reader = TransformReader::new(&b"unchanged"[..], 4, passthrough).unwrap();

    let mut out = String::new();
    reader.read_to_string(&mut out).unwrap();
    assert_eq!(out, "unchanged");
}

#[test]
fn test_processor_applied() {
    let encoded: Vec<u8> = b"secret".iter().map(|b| !b).collect();
    let mut reader =
        TransformReader::new(Cursor::new(encoded), 2, |raw| Ok(Invert(raw))).unwrap();

    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert_eq!(line, "secret");
}

#[test]
fn test_processor_error() {
    let err = TransformReader::<Invert<BufReader<&[u8]>>>::new(&b""[..], 4, |_raw| {
        Err(io::Error::new(io::ErrorKind::InvalidData, "not compressed"))
    })
    .unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    assert_eq!(err.to_string(), "not compressed");
}

#[test]
fn test_close_releases_source() {
    let dropped = Rc::new(Cell::new(false));
    let source = Tracked {
        data: Cursor::new(b"abc".to_vec()),
        dropped: Rc::clone(&dropped),
    };

    let reader = TransformReader::new(source, 8, |raw| Ok(Invert(raw))).unwrap();
    assert!(!dropped.get());

    reader.close();
    assert!(dropped.get());
}

#[test]
fn test_into_staging_buffer() {
    let encoded: Vec<u8> = b"spilled".iter().map(|b| !b).collect();
    let mut input = TransformReader::new(Cursor::new(encoded), 3, |raw| Ok(Invert(raw))).unwrap();
    assert_eq!(input.get_ref().0.get_ref().position(), 0);

    let mut buf = StagingBuffer::new(4, false, true);
    buf.switch_to_write().unwrap();
    io::copy(&mut input, &mut buf).unwrap();
    input.close();

    buf.switch_to_read().unwrap();
    buf.seek(SeekFrom::Start(0)).unwrap();
    let mut out = [0u8; 16];
    let n = buf.read(&mut out).unwrap();
    assert_eq!(out.get(..n).unwrap(), b"spilled");

    buf.close().unwrap();
}
