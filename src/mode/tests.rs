//! Tests for the mode state machine

#![expect(clippy::unwrap_used, reason = "Okay in tests")]

use super::*;

#[test]
fn test_controller_new() {
    let controller = ModeController::new();

    assert_eq!(controller.current(), Mode::None);
    assert!(!controller.is_closed());
}

#[test]
fn test_controller_guard() {
    let mut controller = ModeController::new();

    // Nothing is legal before a switch
    let err = controller.guard(Mode::Write).unwrap_err();
    assert!(matches!(
        err,
        Error::ModeMismatch {
            expected: Mode::Write,
            actual: Mode::None
        }
    ));

    controller.finish_switch(Mode::Write);
    assert!(controller.guard(Mode::Write).is_ok());
    assert!(matches!(
        controller.guard(Mode::Read),
        Err(Error::ModeMismatch {
            expected: Mode::Read,
            actual: Mode::Write
        })
    ));
}

#[test]
fn test_controller_switch() {
    let mut controller = ModeController::new();

    // A real switch has work to do
    assert!(controller.begin_switch(Mode::Write).unwrap());
    controller.finish_switch(Mode::Write);

    // Switching into the current mode is a no-op
    assert!(!controller.begin_switch(Mode::Write).unwrap());
    assert!(controller.begin_switch(Mode::Read).unwrap());
}

#[test]
fn test_controller_reset() {
    let mut controller = ModeController::new();
    controller.finish_switch(Mode::Write);
    controller.reset();

    assert_eq!(controller.current(), Mode::None);
    assert!(!controller.is_closed());
    assert!(controller.begin_switch(Mode::Write).unwrap());
}

#[test]
fn test_controller_close() {
    let mut controller = ModeController::new();
    controller.finish_switch(Mode::Read);
    controller.close();

    assert_eq!(controller.current(), Mode::None);
    assert!(controller.is_closed());
    assert!(matches!(
        controller.begin_switch(Mode::Write),
        Err(Error::Closed)
    ));
    assert!(matches!(
        controller.begin_switch(Mode::Read),
        Err(Error::Closed)
    ));
}

#[test]
fn test_mode_display() {
    assert_eq!(Mode::None.to_string(), "no");
    assert_eq!(Mode::Write.to_string(), "write");
    assert_eq!(Mode::Read.to_string(), "read");
}
