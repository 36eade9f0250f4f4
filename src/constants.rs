//! Size constants shared by both storage backends.
//!
//! # Invariant
//!
//! - [`DEFAULT_BUFFER_SIZE`] is a power of 2 and a multiple of 1 KiB (1024 bytes)
//! - [`MIN_REGION_CAPACITY`] is a power of 2 no larger than `DEFAULT_BUFFER_SIZE`

/// Default chunk size (8 KiB) for the buffered layers over a spill file.
///
/// Two pages on the common 4 KiB page size, which is also what [`std::io::BufReader`] and
/// [`std::io::BufWriter`] pick on their own. Used by
/// [`StagingBufferBuilder`](crate::StagingBufferBuilder) when no size is given.
pub const DEFAULT_BUFFER_SIZE: usize =
    // 2^13 = 8192 = 8 * 1024 = 8 KiB
    1 << 13;

/// Smallest capacity the memory region allocates when it first has to grow.
///
/// Small regions jump straight to this size instead of growing byte by byte.
pub const MIN_REGION_CAPACITY: usize =
    // 2^10 = 1024 = 1 KiB
    1 << 10;

/// Name prefix of spill files created in the host temp directory.
pub const SPILL_PREFIX: &str = "stagebuf";

#[cfg(test)]
mod tests;
