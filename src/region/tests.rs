//! Tests for the GrowableRegion
//!
//! These tests follow the order of the main file: creation, the growth policy, then the data
//! operations that rely on it.

#![expect(
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing,
    clippy::unwrap_used,
    reason = "Okay in tests"
)]

use super::*;
use proptest::prelude::*;

// -----------------------------------------------------------------------------
// GrowableRegion - Creation
// -----------------------------------------------------------------------------

#[test]
fn test_region_new() {
    let region = GrowableRegion::new();

    // Nothing is allocated up front
    assert_eq!(region.buf.len(), 0);
    assert_eq!(region.buf.capacity(), 0);

    // Check internal state matches expectations
    assert_eq!(region.len, 0);
    assert_eq!(region.pos, 0);
    assert_eq!(region.hint, 0);
    assert_eq!(region.total_written, 0);
    assert!(region.is_empty());
}

#[test]
fn test_region_with_capacity_hint() {
    let region = GrowableRegion::with_capacity_hint(100);

    // The hint is remembered, not allocated
    assert_eq!(region.hint, 100);
    assert_eq!(region.capacity(), 0);
}

// -----------------------------------------------------------------------------
// GrowableRegion - Growth policy
// -----------------------------------------------------------------------------

#[test]
fn test_next_capacity_fits() {
    let mut region = GrowableRegion::new();
    region.buf = vec![0; 2048];

    // Anything up to the capacity needs no reallocation
    assert_eq!(region.next_capacity(0, 0).unwrap(), None);
    assert_eq!(region.next_capacity(2048, 2048).unwrap(), None);
}

#[test]
fn test_next_capacity_small_jump() {
    let region = GrowableRegion::new();

    // Small regions missing less than the minimum jump straight to it
    assert_eq!(region.next_capacity(1, 1).unwrap(), Some(MIN_REGION_CAPACITY));
    assert_eq!(
        region.next_capacity(1023, 1023).unwrap(),
        Some(MIN_REGION_CAPACITY)
    );

    // ...but the hint wins on the first allocation if it is larger
    let region = GrowableRegion::with_capacity_hint(3000);
    assert_eq!(region.next_capacity(1, 1).unwrap(), Some(3000));

    // ...and a smaller hint changes nothing
    let region = GrowableRegion::with_capacity_hint(100);
    assert_eq!(region.next_capacity(1, 1).unwrap(), Some(MIN_REGION_CAPACITY));
}

#[test]
fn test_next_capacity_proportional() {
    let mut region = GrowableRegion::new();
    region.buf = vec![0; MIN_REGION_CAPACITY];
    region.len = MIN_REGION_CAPACITY;
    region.pos = MIN_REGION_CAPACITY;

    // Missing 100 bytes for a 100 byte write: max(100 + 25, 1024 / 4) = 256
    assert_eq!(
        region.next_capacity(MIN_REGION_CAPACITY + 100, 100).unwrap(),
        Some(MIN_REGION_CAPACITY + 256)
    );

    // Missing 4000 bytes for a 4000 byte write: max(4000 + 1000, 256) = 5000
    assert_eq!(
        region.next_capacity(MIN_REGION_CAPACITY + 4000, 4000).unwrap(),
        Some(MIN_REGION_CAPACITY + 5000)
    );

    // Large requests on an empty region skip the minimum jump
    let region = GrowableRegion::new();
    assert_eq!(region.next_capacity(2048, 2048).unwrap(), Some(2048 + 512));
}

#[test]
fn test_next_capacity_overflow() {
    let mut region = GrowableRegion::new();
    region.buf = vec![0; MIN_REGION_CAPACITY];
    region.pos = MIN_REGION_CAPACITY;

    let err = region.next_capacity(usize::MAX, usize::MAX).unwrap_err();
    assert!(matches!(err, Error::OutOfMemory { .. }));
}

#[test]
fn test_grow() {
    let mut region = GrowableRegion::new();

    // First growth allocates the minimum and extends the length
    region.grow(10).unwrap();
    assert_eq!(region.capacity(), MIN_REGION_CAPACITY);
    assert_eq!(region.len(), 10);

    // Growing within capacity only extends the length
    region.pos = 10;
    region.grow(100).unwrap();
    assert_eq!(region.capacity(), MIN_REGION_CAPACITY);
    assert_eq!(region.len(), 110);

    // Growing from the middle never shortens the data
    region.pos = 0;
    region.grow(5).unwrap();
    assert_eq!(region.len(), 110);
}

#[test]
fn test_grow_overflow() {
    let mut region = GrowableRegion::new();
    region.pos = 1;

    // The cursor plus the request overflows before anything is allocated
    let err = region.grow(usize::MAX).unwrap_err();
    assert!(matches!(err, Error::OutOfMemory { .. }));
    assert_eq!(region.capacity(), 0);
    assert_eq!(region.len(), 0);
}

#[test]
fn test_grow_out_of_memory() {
    let mut region = GrowableRegion::new();
    region.buf = vec![0; MIN_REGION_CAPACITY];
    region.len = MIN_REGION_CAPACITY;
    region.pos = MIN_REGION_CAPACITY;

    // Asking for more than the allocator can give fails with a checked error
    let err = region.grow(isize::MAX as usize).unwrap_err();
    assert!(matches!(err, Error::OutOfMemory { .. }));

    // The region is left untouched
    assert_eq!(region.capacity(), MIN_REGION_CAPACITY);
    assert_eq!(region.len(), MIN_REGION_CAPACITY);
}

// -----------------------------------------------------------------------------
// GrowableRegion - Write and read
// -----------------------------------------------------------------------------

#[test]
fn test_region_write() {
    let mut region = GrowableRegion::new();

    assert_eq!(region.write(b"123456789").unwrap(), 9);
    assert_eq!(region.write(b"0").unwrap(), 1);

    assert_eq!(region.as_slice(), b"1234567890");
    assert_eq!(region.pos(), 10);
    assert_eq!(region.total_written(), 10);

    // An empty write is accepted and changes nothing
    assert_eq!(region.write(b"").unwrap(), 0);
    assert_eq!(region.len(), 10);
}

#[test]
fn test_region_write_overwrites_in_place() {
    let mut region = GrowableRegion::new();
    region.write(b"Hello, World!").unwrap();

    region.seek(SeekFrom::Start(7)).unwrap();
    region.write(b"Rust").unwrap();

    // The tail past the overwrite stays
    assert_eq!(region.as_slice(), b"Hello, Rustd!");
    assert_eq!(region.total_written(), 17);
}

#[test]
fn test_region_read() {
    let mut region = GrowableRegion::new();
    region.write(b"Hello, World!").unwrap();
    region.seek(SeekFrom::Start(0)).unwrap();

    // Reads are capped by the output size
    let mut buf = [0u8; 5];
    assert_eq!(region.read(&mut buf).unwrap(), 5);
    assert_eq!(&buf, b"Hello");

    // ...and by what is left
    let mut buf = [0u8; 100];
    let n = region.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b", World!");

    // At the end an empty read is fine, a real one is end-of-stream
    assert_eq!(region.read(&mut []).unwrap(), 0);
    assert!(matches!(
        region.read(&mut buf).unwrap_err(),
        Error::EndOfStream
    ));
}

#[test]
fn test_region_growth_preserves_data() {
    let mut region = GrowableRegion::new();
    let mut expected = Vec::new();

    // Increasing write sizes force many reallocations
    for i in 0..200u32 {
        let chunk: Vec<u8> = (0..i * 7).map(|b| (b ^ i) as u8).collect();
        region.write(&chunk).unwrap();
        expected.extend_from_slice(&chunk);
    }

    assert!(region.capacity() >= expected.len());
    assert_eq!(region.as_slice(), expected.as_slice());
}

// -----------------------------------------------------------------------------
// GrowableRegion - Seek and truncate
// -----------------------------------------------------------------------------

#[test]
fn test_region_seek() {
    let mut region = GrowableRegion::new();
    region.write(b"0123456789").unwrap();

    assert_eq!(region.seek(SeekFrom::Start(0)).unwrap(), 0);
    assert_eq!(region.seek(SeekFrom::Current(3)).unwrap(), 3);
    assert_eq!(region.seek(SeekFrom::End(0)).unwrap(), 10);
    assert_eq!(region.seek(SeekFrom::End(-10)).unwrap(), 0);
    assert_eq!(region.pos(), 0);
}

#[test]
fn test_region_seek_bounds() {
    let mut region = GrowableRegion::new();
    region.write(b"0123456789").unwrap();
    region.seek(SeekFrom::Start(4)).unwrap();

    // Past the end
    assert!(matches!(
        region.seek(SeekFrom::Start(11)).unwrap_err(),
        Error::SeekOutOfRange { offset: 11 }
    ));
    assert!(matches!(
        region.seek(SeekFrom::End(1)).unwrap_err(),
        Error::SeekOutOfRange { offset: 11 }
    ));

    // Before the start
    assert!(matches!(
        region.seek(SeekFrom::Current(-5)).unwrap_err(),
        Error::SeekOutOfRange { offset: -1 }
    ));

    // Failed seeks leave the cursor alone
    assert_eq!(region.pos(), 4);

    // Exactly the end is fine and reads end-of-stream
    assert_eq!(region.seek(SeekFrom::End(0)).unwrap(), 10);
    let mut buf = [0u8; 4];
    assert!(region.read(&mut buf).unwrap_err().is_end_of_stream());
}

#[test]
fn test_region_truncate() {
    let mut region = GrowableRegion::new();
    region.write(b"0123456789").unwrap();

    // Truncating below the cursor pulls it back
    region.truncate(4).unwrap();
    assert_eq!(region.as_slice(), b"0123");
    assert_eq!(region.pos(), 4);

    // Truncating above the cursor leaves it be
    region.seek(SeekFrom::Start(1)).unwrap();
    region.truncate(2).unwrap();
    assert_eq!(region.pos(), 1);

    // Out of range is rejected without effect
    assert!(matches!(
        region.truncate(3).unwrap_err(),
        Error::TruncateOutOfRange {
            requested: 3,
            size: 2
        }
    ));
    assert_eq!(region.len(), 2);
}

#[test]
fn test_region_truncate_zero_then_write() {
    let mut region = GrowableRegion::new();
    region.write(b"old data").unwrap();
    let cap = region.capacity();

    region.truncate(0).unwrap();
    assert_eq!(region.pos(), 0);

    region.write(b"new").unwrap();
    assert_eq!(region.as_slice(), b"new");

    // Space is reused, the counter keeps the lifetime total
    assert_eq!(region.capacity(), cap);
    assert_eq!(region.total_written(), 11);
}

// -----------------------------------------------------------------------------
// impl Backend
// -----------------------------------------------------------------------------

#[test]
fn test_region_backend() {
    let mut region = GrowableRegion::with_capacity_hint(64);
    let backend: &mut dyn Backend = &mut region;

    backend.enter(Mode::Write).unwrap();
    backend.write(b"abc").unwrap();
    backend.flush().unwrap();
    assert_eq!(backend.size().unwrap(), 3);
    assert_eq!(backend.offset(), Some(3));
    assert_eq!(backend.spill_path(), None);

    backend.close().unwrap();
    assert_eq!(backend.size().unwrap(), 0);
    assert_eq!(backend.offset(), Some(0));
    assert_eq!(backend.total_written(), 3);

    // Closing twice is harmless
    backend.close().unwrap();
    assert_eq!(region.capacity(), 0);
}

// -----------------------------------------------------------------------------
// Properties
// -----------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_region_round_trip(chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..2048), 0..32)) {
        let mut region = GrowableRegion::new();
        let mut expected = Vec::new();

        for chunk in &chunks {
            prop_assert_eq!(region.write(chunk).unwrap(), chunk.len());
            expected.extend_from_slice(chunk);
        }

        region.seek(SeekFrom::Start(0)).unwrap();
        let mut actual = vec![0u8; expected.len()];
        let mut filled = 0;
        while filled < actual.len() {
            filled += region.read(&mut actual[filled..]).unwrap();
        }

        prop_assert_eq!(actual, expected);
        prop_assert!(region.pos() <= region.len());
        prop_assert!(region.len() <= region.capacity());
    }
}
