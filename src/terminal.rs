//! Controlling-terminal mode management.
//!
//! Captures the terminal's line discipline once, installs a raw mode suited
//! to byte-at-a-time proxying, and guarantees the saved mode is restored
//! exactly once on every exit path (normal exit, child death, fatal error,
//! unwind). Job control needs the mode flipped back and forth while the
//! session is alive, so the controller keeps both the saved and the raw
//! discipline around and tracks which one is installed.

use nix::sys::termios::{
    tcgetattr, tcsetattr, InputFlags, LocalFlags, SetArg, SpecialCharacterIndices, Termios,
};
use std::io;

/// Terminal mode controller for the proxy's controlling terminal (stdin).
///
/// Mode get/set failures are non-fatal: a warning is logged and the session
/// continues best-effort, because some environments tolerate a terminal that
/// cannot be reconfigured. With no captured mode, `restore` is a no-op.
pub struct TermController {
    saved: Option<Termios>,
    raw: Option<Termios>,
    raw_active: bool,
}

impl TermController {
    pub fn new() -> Self {
        Self {
            saved: None,
            raw: None,
            raw_active: false,
        }
    }

    /// Capture the current mode and install raw mode: no line buffering, no
    /// echo, no signal-generating control characters, break conditions
    /// ignored, reads return after a single byte with no inter-byte timeout.
    pub fn enter_raw(&mut self) {
        if self.saved.is_none() {
            match tcgetattr(io::stdin()) {
                Ok(t) => {
                    let mut raw = t.clone();
                    raw.local_flags.remove(
                        LocalFlags::ICANON
                            | LocalFlags::ISIG
                            | LocalFlags::ECHO
                            | LocalFlags::ECHOCTL,
                    );
                    raw.input_flags.insert(InputFlags::IGNBRK);
                    raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
                    raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
                    self.saved = Some(t);
                    self.raw = Some(raw);
                }
                Err(e) => {
                    log::warn!("tcgetattr on stdin failed: {e}");
                    return;
                }
            }
        }
        if let Some(raw) = &self.raw {
            if let Err(e) = tcsetattr(io::stdin(), SetArg::TCSAFLUSH, raw) {
                log::warn!("tcsetattr (raw mode) failed: {e}");
            } else {
                self.raw_active = true;
            }
        }
    }

    /// Reinstate the saved mode ahead of a job-control stop. The captured
    /// modes are kept so [`resume_raw`](Self::resume_raw) can re-enter raw.
    pub fn suspend(&mut self) {
        if !self.raw_active {
            return;
        }
        if let Some(saved) = &self.saved {
            if let Err(e) = tcsetattr(io::stdin(), SetArg::TCSANOW, saved) {
                log::warn!("tcsetattr (suspend) failed: {e}");
            }
        }
        self.raw_active = false;
    }

    /// Re-enter raw mode after a job-control continue.
    pub fn resume_raw(&mut self) {
        self.enter_raw();
    }

    /// Final restore of the saved mode. Idempotent: only the first call
    /// after raw mode was entered does anything.
    pub fn restore(&mut self) {
        self.suspend();
    }

    /// The suspend character (VSUSP) of the mode the terminal had before we
    /// touched it, usually Ctrl-Z.
    pub fn suspend_char(&self) -> Option<u8> {
        self.saved
            .as_ref()
            .map(|t| t.control_chars[SpecialCharacterIndices::VSUSP as usize])
    }

    /// Whether raw mode is currently installed.
    pub fn raw_active(&self) -> bool {
        self.raw_active
    }
}

impl Default for TermController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TermController {
    fn drop(&mut self) {
        // Covers panics and early returns; a no-op after restore().
        self.restore();
    }
}
