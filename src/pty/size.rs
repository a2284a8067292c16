//! Terminal window dimensions

use nix::pty::Winsize;
use std::os::fd::AsRawFd;

/// Terminal size configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PtySize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for PtySize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

impl PtySize {
    /// Query the window size of a terminal descriptor, falling back to the
    /// default when the ioctl fails or reports a degenerate size.
    pub fn from_tty<F: AsRawFd>(fd: &F) -> Self {
        let mut ws: Winsize = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::ioctl(fd.as_raw_fd(), libc::TIOCGWINSZ as libc::c_ulong, &mut ws) };
        if rc == -1 || ws.ws_row == 0 || ws.ws_col == 0 {
            return Self::default();
        }
        Self {
            rows: ws.ws_row,
            cols: ws.ws_col,
        }
    }
}

impl From<PtySize> for Winsize {
    fn from(size: PtySize) -> Self {
        Winsize {
            ws_row: size.rows,
            ws_col: size.cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        }
    }
}
