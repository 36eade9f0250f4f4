//! Tests for the constants
//!
//! This test validates the relationships between the size constants.

use super::*;

#[test]
#[expect(
    clippy::assertions_on_constants,
    reason = "Asserting an invariant on the constants"
)]
fn test_invariant() {
    // DEFAULT_BUFFER_SIZE is a multiple of 1 KiB
    assert_eq!(DEFAULT_BUFFER_SIZE % 1024, 0);

    // DEFAULT_BUFFER_SIZE is a power of two
    assert_eq!(DEFAULT_BUFFER_SIZE & (DEFAULT_BUFFER_SIZE - 1), 0);

    // MIN_REGION_CAPACITY is a power of two
    assert_eq!(MIN_REGION_CAPACITY & (MIN_REGION_CAPACITY - 1), 0);

    // MIN_REGION_CAPACITY never exceeds the default chunk size
    assert!(MIN_REGION_CAPACITY <= DEFAULT_BUFFER_SIZE);
}

#[test]
fn test_spill_prefix() {
    // The prefix must be a plain file name fragment
    assert!(!SPILL_PREFIX.is_empty());
    assert!(!SPILL_PREFIX.contains(std::path::MAIN_SEPARATOR));
}
