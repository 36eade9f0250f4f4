//! The write/read state machine.
//!
//! A [`StagingBuffer`](crate::StagingBuffer) starts in [`Mode::None`], moves to [`Mode::Write`] to
//! accumulate bytes and to [`Mode::Read`] to consume them. [`ModeController`] owns the current
//! mode and enforces the guard rules; the backends only ever learn about the mode they are asked
//! to enter.

use crate::error::{Error, Result};
use std::fmt;

/// The mode a staging buffer currently occupies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No mode selected yet, or the buffer was closed.
    #[default]
    None,
    /// Accepting writes.
    Write,
    /// Serving reads.
    Read,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "no",
            Self::Write => "write",
            Self::Read => "read",
        };
        f.write_str(name)
    }
}

/// Tracks the current [`Mode`] and whether the owner was closed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct ModeController {
    mode: Mode,
    closed: bool,
}

impl ModeController {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn current(&self) -> Mode {
        self.mode
    }

    /// Fails with [`Error::ModeMismatch`] unless the current mode is `expected`.
    #[inline]
    pub(crate) fn guard(&self, expected: Mode) -> Result<()> {
        if self.mode == expected {
            return Ok(());
        }

        Err(Error::ModeMismatch {
            expected,
            actual: self.mode,
        })
    }

    /// Decides whether a switch to `target` has any work to do.
    ///
    /// Returns `Ok(false)` when the buffer is already in `target` (the switch is a no-op) and
    /// [`Error::Closed`] once the buffer was closed.
    pub(crate) fn begin_switch(&self, target: Mode) -> Result<bool> {
        if self.mode == target {
            return Ok(false);
        }

        if self.closed {
            return Err(Error::Closed);
        }

        Ok(true)
    }

    /// Records a completed switch.
    #[inline]
    pub(crate) fn finish_switch(&mut self, target: Mode) {
        self.mode = target;
    }

    /// Drops back to [`Mode::None`]. The owner may switch modes again afterwards.
    pub(crate) fn reset(&mut self) {
        self.mode = Mode::None;
    }

    /// Drops back to [`Mode::None`] for good.
    pub(crate) fn close(&mut self) {
        self.mode = Mode::None;
        self.closed = true;
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests;
