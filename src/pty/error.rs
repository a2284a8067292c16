//! PTY error types

use nix::errno::Errno;
use thiserror::Error;

/// Error type for PTY operations
#[derive(Debug, Error)]
pub enum PtyError {
    /// Failed to allocate the pty pair
    #[error("failed to open pty: {0}")]
    Open(#[source] Errno),

    /// Failed to fork/exec the target command
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to apply window dimensions to the pty master
    #[error("failed to resize pty: {0}")]
    Resize(#[source] Errno),
}
