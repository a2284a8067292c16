//! Asynchronous signal relay.
//!
//! Installs minimal handlers for the three signals the proxy cares about:
//! window resize (SIGWINCH), child state change (SIGCHLD) and continue
//! (SIGCONT). Each handler only stores into a static atomic; the event loop
//! polls and clears the flags once per iteration, so all real work happens
//! synchronously on the loop thread.

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};

static WINCH_FLAG: AtomicBool = AtomicBool::new(false);
static CHLD_FLAG: AtomicBool = AtomicBool::new(false);
static CONT_FLAG: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_winch(_: libc::c_int) {
    WINCH_FLAG.store(true, Ordering::SeqCst);
}

extern "C" fn handle_chld(_: libc::c_int) {
    CHLD_FLAG.store(true, Ordering::SeqCst);
}

extern "C" fn handle_cont(_: libc::c_int) {
    CONT_FLAG.store(true, Ordering::SeqCst);
}

/// Install the three flag-setting handlers. Other signals are untouched;
/// blockable signals are masked while a handler runs.
pub fn install() -> Result<(), nix::Error> {
    install_one(Signal::SIGWINCH, handle_winch)?;
    install_one(Signal::SIGCHLD, handle_chld)?;
    install_one(Signal::SIGCONT, handle_cont)?;
    Ok(())
}

fn install_one(signal: Signal, handler: extern "C" fn(libc::c_int)) -> Result<(), nix::Error> {
    let action = SigAction::new(SigHandler::Handler(handler), SaFlags::SA_RESTART, SigSet::all());
    unsafe { sigaction(signal, &action) }?;
    Ok(())
}

/// Consume the resize flag.
pub fn take_winch() -> bool {
    WINCH_FLAG.swap(false, Ordering::SeqCst)
}

/// Consume the child-state-changed flag.
pub fn take_chld() -> bool {
    CHLD_FLAG.swap(false, Ordering::SeqCst)
}

/// Consume the continue flag.
pub fn take_cont() -> bool {
    CONT_FLAG.swap(false, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::signal::raise;

    #[test]
    fn test_flags_start_clear_and_reset_on_take() {
        // take_* drains whatever state is there; a second take is false.
        let _ = take_winch();
        assert!(!take_winch());

        WINCH_FLAG.store(true, Ordering::SeqCst);
        assert!(take_winch());
        assert!(!take_winch());
    }

    #[test]
    fn test_handler_sets_only_its_flag() {
        let _ = (take_winch(), take_chld(), take_cont());
        install().expect("sigaction should succeed");
        raise(Signal::SIGWINCH).expect("raise");
        assert!(take_winch());
        assert!(!take_chld());
        assert!(!take_cont());
    }
}
