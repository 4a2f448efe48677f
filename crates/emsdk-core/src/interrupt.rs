//! Ctrl-C handling.
//!
//! The handler only raises a flag. Long-running loops poll it through
//! [`check`] and unwind with [`Error::Interrupted`] after cleaning up.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn on_sigint(_: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install the SIGINT handler. Without it Ctrl-C terminates the process
/// immediately, which is also acceptable on hosts without signals.
#[allow(unsafe_code)]
pub fn install_handler() {
    #[cfg(unix)]
    {
        let handler: extern "C" fn(libc::c_int) = on_sigint;
        // SAFETY: the handler only performs an atomic store, which is
        // async-signal-safe.
        unsafe {
            libc::signal(libc::SIGINT, handler as libc::sighandler_t);
        }
    }
}

/// Whether Ctrl-C has been pressed.
pub fn is_interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Fail with [`Error::Interrupted`] once Ctrl-C has been pressed.
pub fn check() -> Result<()> {
    if is_interrupted() {
        Err(Error::Interrupted)
    } else {
        Ok(())
    }
}

/// Raise the flag by hand.
pub fn trigger() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}
