//! Runs in its own process: the interrupt flag is global.

use emsdk_core::Error;
use emsdk_core::interrupt;

#[test]
fn interrupt_unwinds_as_an_error() {
    assert!(interrupt::check().is_ok());
    interrupt::trigger();
    assert!(interrupt::is_interrupted());
    assert!(matches!(interrupt::check(), Err(Error::Interrupted)));
    assert_eq!(Error::Interrupted.to_string(), "aborted by user, exiting");
}
