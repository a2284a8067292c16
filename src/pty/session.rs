//! PTY session: child process attached to the slave side of a pty pair.

use super::{PtyError, PtySize};
use nix::errno::Errno;
use nix::pty::openpty;
use nix::sys::signal::{kill, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{read, write, Pid};
use std::io;
use std::os::fd::{AsFd, AsRawFd, OwnedFd, RawFd};
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus};

/// A spawned child running on the slave side of a pty, plus the master
/// descriptor the proxy relays through. The child inherits environment and
/// working directory unmodified; the slave becomes its controlling terminal.
#[derive(Debug)]
pub struct PtySession {
    master: OwnedFd,
    child: Child,
}

impl PtySession {
    /// Allocate a pty sized to the controlling terminal and exec `command`
    /// on its slave side. An exec failure surfaces here as a spawn error.
    pub fn spawn(command: &str, args: &[String]) -> Result<Self, PtyError> {
        let ws: nix::pty::Winsize = PtySize::from_tty(&io::stdin()).into();
        let pty = openpty(Some(&ws), None).map_err(PtyError::Open)?;

        let slave_fd = pty.slave.as_raw_fd();
        let child = unsafe {
            Command::new(command)
                .args(args)
                .pre_exec(move || {
                    // New session with the pty slave as controlling terminal,
                    // wired to the child's standard descriptors.
                    if libc::setsid() == -1 {
                        return Err(io::Error::last_os_error());
                    }
                    if libc::ioctl(slave_fd, libc::TIOCSCTTY as libc::c_ulong, 0) == -1 {
                        return Err(io::Error::last_os_error());
                    }
                    for target in 0..3 {
                        if libc::dup2(slave_fd, target) == -1 {
                            return Err(io::Error::last_os_error());
                        }
                    }
                    if slave_fd > 2 {
                        libc::close(slave_fd);
                    }
                    Ok(())
                })
                .spawn()
                .map_err(|e| PtyError::Spawn {
                    command: command.to_string(),
                    source: e,
                })?
        };

        drop(pty.slave);
        log::debug!("spawned '{}' (pid {}) on pty", command, child.id());

        Ok(Self {
            master: pty.master,
            child,
        })
    }

    /// The child's process id.
    pub fn pid(&self) -> Pid {
        Pid::from_raw(self.child.id() as i32)
    }

    /// Raw master descriptor, for multiplexed waits.
    pub fn master_raw_fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    /// Sync the pty's window size to the controlling terminal's current one.
    pub fn resize(&self) -> Result<(), PtyError> {
        let ws: nix::pty::Winsize = PtySize::from_tty(&io::stdin()).into();
        let rc = unsafe {
            libc::ioctl(
                self.master.as_raw_fd(),
                libc::TIOCSWINSZ as libc::c_ulong,
                &ws,
            )
        };
        if rc == -1 {
            return Err(PtyError::Resize(Errno::last()));
        }
        Ok(())
    }

    /// Read a single byte of child output from the master.
    /// `Ok(None)` means end-of-file (the child closed its side).
    pub fn read_byte(&self) -> Result<Option<u8>, Errno> {
        let mut buf = [0u8; 1];
        loop {
            match read(self.master.as_raw_fd(), &mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(Errno::EINTR) => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Write the whole buffer to the master, retrying short writes and
    /// interrupted calls.
    pub fn write_all(&self, data: &[u8]) -> Result<(), Errno> {
        let mut written = 0;
        while written < data.len() {
            match write(self.master.as_fd(), &data[written..]) {
                Ok(n) => written += n,
                Err(Errno::EINTR) | Err(Errno::EAGAIN) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Non-blocking probe: has the child just been stopped by SIGSTOP?
    /// A child that stopped itself some other way (SIGTSTP from its own
    /// terminal) manages its own job control and is not our business.
    pub fn stopped_by_sigstop(&self) -> bool {
        match waitpid(
            self.pid(),
            Some(WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED),
        ) {
            Ok(WaitStatus::Stopped(_, Signal::SIGSTOP)) => true,
            Ok(_) => false,
            Err(e) => {
                log::warn!("waitpid failed: {e}");
                false
            }
        }
    }

    /// Forward SIGCONT to the child.
    pub fn signal_continue(&self) -> Result<(), Errno> {
        kill(self.pid(), Signal::SIGCONT)
    }

    /// Check whether the child has exited.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Best-effort final reap of the child. The status may already have
    /// been consumed by the job-control waitpid; errors are ignored.
    pub fn reap(&mut self) {
        let _ = self.child.try_wait();
    }
}
