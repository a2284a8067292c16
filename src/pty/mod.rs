//! PTY module - allocates the pseudoterminal and runs the child on it.
//!
//! # Structure
//!
//! - [`error`] - Error types for PTY operations
//! - [`size`] - Terminal window dimensions
//! - [`session`] - Child process attached to a pty pair

mod error;
mod session;
mod size;

pub use error::PtyError;
pub use session::PtySession;
pub use size::PtySize;
