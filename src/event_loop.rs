//! Proxy event loop.
//!
//! One iteration: a bounded multiplexed wait on terminal input and pty
//! master output, then deadline handling for a pending escape prefix, then
//! signal-flag processing (resize, child stopped, continued), then master
//! draining, then terminal input. Signal work always precedes I/O within an
//! iteration, and master output is always drained before new input is read,
//! so a stop/continue transition never leaves output stuck behind a read.
//!
//! The loop ends only when the child goes away (end-of-file or EIO on the
//! master) or the master write side breaks; both paths restore the terminal
//! mode and count as a normal exit.

use crate::config::Config;
use crate::pty::PtySession;
use crate::signals;
use crate::terminal::TermController;
use crate::translate::Translator;
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::signal::{raise, Signal};
use nix::unistd::{read, write};
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Idle tick of the multiplexed wait. Keeps signal-flag processing prompt
/// even when no descriptor becomes readable and no deadline is armed.
const IDLE_TICK: Duration = Duration::from_millis(20);

/// Fatal event-loop failures. Everything else is handled in place: warn and
/// continue, or end the loop cleanly.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("poll failed: {0}")]
    Poll(#[source] Errno),
}

/// Child process-group state as observed through waitpid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Running,
    Stopped,
}

/// Actions the loop must perform on a job-control transition, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    /// Put the terminal back into its saved mode.
    RestoreMode,
    /// Stop ourselves so the whole pipeline suspends under the shell.
    RaiseStop,
    /// Re-install raw mode.
    ReenterRaw,
    /// Forward SIGCONT to the child.
    ContinueChild,
}

/// Child stopped: the proxy owns the terminal mode, so it must hand the
/// mode back *before* stopping itself, or the shell gets a raw terminal
/// with no process reading it. Idempotent while already stopped.
pub fn on_child_stopped(state: &mut JobState) -> &'static [JobAction] {
    match state {
        JobState::Running => {
            *state = JobState::Stopped;
            &[JobAction::RestoreMode, JobAction::RaiseStop]
        }
        JobState::Stopped => &[],
    }
}

/// Continue received: raw mode comes back before the child resumes, so the
/// child never sees its terminal half-configured. Idempotent while running.
pub fn on_continued(state: &mut JobState) -> &'static [JobAction] {
    match state {
        JobState::Stopped => {
            *state = JobState::Running;
            &[JobAction::ReenterRaw, JobAction::ContinueChild]
        }
        JobState::Running => &[],
    }
}

enum Flow {
    Continue,
    Exit,
}

/// A running proxy session: the pty, the saved terminal mode, the keystroke
/// translator and the single outstanding disambiguation deadline. Owns every
/// piece of mutable session state; signal handlers only touch the atomic
/// flags in [`signals`].
pub struct Session {
    pty: PtySession,
    term: TermController,
    keys: Translator,
    flush_timeout: Duration,
    deadline: Option<Instant>,
    no_suspend: bool,
    suspend_char: Option<u8>,
    job: JobState,
}

impl Session {
    /// Enter raw mode, install the signal handlers, sync the pty window
    /// size, and wrap it all into a session. Mode and resize failures are
    /// non-fatal (logged, best-effort).
    pub fn new(pty: PtySession, config: &Config) -> Self {
        let mut term = TermController::new();
        term.enter_raw();
        if let Err(e) = signals::install() {
            log::warn!("failed to install signal handlers: {e}");
        }
        if let Err(e) = pty.resize() {
            log::warn!("initial window size sync failed: {e}");
        }
        let suspend_char = term.suspend_char();
        Self {
            pty,
            term,
            keys: Translator::default(),
            flush_timeout: Duration::from_millis(config.keys.flush_timeout_ms),
            deadline: None,
            no_suspend: config.session.no_suspend,
            suspend_char,
            job: JobState::Running,
        }
    }

    /// Drive the proxy until the child goes away. The saved terminal mode
    /// is restored on every way out of here, error paths included.
    pub fn run(&mut self) -> Result<(), SessionError> {
        let result = self.run_loop();
        self.term.restore();
        self.pty.reap();
        result
    }

    fn run_loop(&mut self) -> Result<(), SessionError> {
        loop {
            let (master_ready, stdin_ready) = self.wait_for_io()?;

            if let Flow::Exit = self.service_deadline() {
                return Ok(());
            }
            self.process_signal_flags();
            if master_ready {
                if let Flow::Exit = self.drain_master() {
                    return Ok(());
                }
            }
            if stdin_ready {
                if let Flow::Exit = self.handle_terminal_input() {
                    return Ok(());
                }
            }
        }
    }

    /// Bounded wait for readability on the terminal and the master.
    /// An interrupted wait counts as "nothing readable"; the interrupting
    /// signal's flag gets processed right after.
    fn wait_for_io(&mut self) -> Result<(bool, bool), SessionError> {
        let timeout = self.poll_timeout();
        let stdin = io::stdin();
        let master = unsafe { BorrowedFd::borrow_raw(self.pty.master_raw_fd()) };
        let mut fds = [
            PollFd::new(master, PollFlags::POLLIN),
            PollFd::new(stdin.as_fd(), PollFlags::POLLIN),
        ];
        match poll(&mut fds, timeout) {
            Ok(0) | Err(Errno::EINTR) => Ok((false, false)),
            Ok(_) => {
                // POLLHUP on the master means the child closed its side;
                // the follow-up read observes it as EOF/EIO.
                let master_ready = fds[0]
                    .revents()
                    .is_some_and(|r| r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP));
                let stdin_ready = fds[1]
                    .revents()
                    .is_some_and(|r| r.contains(PollFlags::POLLIN));
                Ok((master_ready, stdin_ready))
            }
            Err(e) => Err(SessionError::Poll(e)),
        }
    }

    fn poll_timeout(&self) -> PollTimeout {
        let wait = match self.deadline {
            Some(d) => d.saturating_duration_since(Instant::now()).min(IDLE_TICK),
            None => IDLE_TICK,
        };
        PollTimeout::from(wait.as_millis() as u16)
    }

    /// Flush a pending escape prefix once its deadline has passed: nothing
    /// disambiguating arrived, so the prefix was literal input.
    fn service_deadline(&mut self) -> Flow {
        let Some(deadline) = self.deadline else {
            return Flow::Continue;
        };
        if Instant::now() < deadline {
            return Flow::Continue;
        }
        self.deadline = None;
        let out = self.keys.flush_pending();
        self.forward_to_child(&out)
    }

    /// Apply pending signal flags in the fixed order resize, stopped,
    /// continued, before any I/O, so e.g. a resize that arrived during the
    /// wait is visible to the child before its next read.
    fn process_signal_flags(&mut self) {
        if signals::take_winch() {
            if let Err(e) = self.pty.resize() {
                log::warn!("{e}");
            }
        }
        if signals::take_chld() && self.pty.stopped_by_sigstop() {
            for action in on_child_stopped(&mut self.job) {
                self.apply_job_action(*action);
            }
        }
        if signals::take_cont() {
            for action in on_continued(&mut self.job) {
                self.apply_job_action(*action);
            }
        }
    }

    fn apply_job_action(&mut self, action: JobAction) {
        match action {
            JobAction::RestoreMode => self.term.suspend(),
            JobAction::RaiseStop => {
                // Execution resumes on the line after once SIGCONT arrives.
                if let Err(e) = raise(Signal::SIGSTOP) {
                    log::warn!("raise SIGSTOP failed: {e}");
                }
            }
            JobAction::ReenterRaw => self.term.resume_raw(),
            JobAction::ContinueChild => {
                if let Err(e) = self.pty.signal_continue() {
                    log::warn!("SIGCONT to child failed: {e}");
                }
            }
        }
    }

    /// Relay one byte of child output to stdout. EOF or EIO means the child
    /// exited and closed its side: end the session.
    fn drain_master(&mut self) -> Flow {
        match self.pty.read_byte() {
            Ok(Some(byte)) => {
                if let Err(e) = write_all(&io::stdout(), &[byte]) {
                    log::warn!("write to stdout failed: {e}");
                }
                Flow::Continue
            }
            Ok(None) | Err(Errno::EIO) | Err(Errno::EPIPE) => Flow::Exit,
            Err(e) => {
                log::warn!("read from pty master failed: {e}");
                Flow::Continue
            }
        }
    }

    /// Read one keystroke byte, translate it, forward the result.
    fn handle_terminal_input(&mut self) -> Flow {
        let byte = match read_stdin_byte() {
            Ok(Some(b)) => b,
            Ok(None) => return Flow::Continue,
            Err(e) => {
                log::warn!("read from stdin failed: {e}");
                return Flow::Continue;
            }
        };

        // -z mode: the suspend character is swallowed outright rather than
        // reaching the child's terminal.
        if self.no_suspend && Some(byte) == self.suspend_char {
            return Flow::Continue;
        }

        let out = self.keys.advance(byte);
        self.deadline = if self.keys.is_pending() {
            Some(Instant::now() + self.flush_timeout)
        } else {
            None
        };
        self.forward_to_child(&out)
    }

    /// Write translated bytes to the master. A broken master (EIO/EPIPE)
    /// ends the session cleanly; other failures are best-effort.
    fn forward_to_child(&mut self, data: &[u8]) -> Flow {
        if data.is_empty() {
            return Flow::Continue;
        }
        match self.pty.write_all(data) {
            Ok(()) => Flow::Continue,
            Err(Errno::EIO) | Err(Errno::EPIPE) => Flow::Exit,
            Err(e) => {
                log::warn!("write to pty master failed: {e}");
                Flow::Continue
            }
        }
    }
}

fn read_stdin_byte() -> Result<Option<u8>, Errno> {
    let stdin = io::stdin();
    let mut buf = [0u8; 1];
    loop {
        match read(stdin.as_raw_fd(), &mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e),
        }
    }
}

fn write_all<F: AsFd>(fd: &F, data: &[u8]) -> Result<(), Errno> {
    let mut written = 0;
    while written < data.len() {
        match write(fd.as_fd(), &data[written..]) {
            Ok(n) => written += n,
            Err(Errno::EINTR) | Err(Errno::EAGAIN) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
