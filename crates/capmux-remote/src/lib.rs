//! # capmux-remote
//!
//! The remote command channel: executes one command on a remote host and
//! returns its complete stdout/stderr without blocking forever.
//!
//! A [`RemoteSession`] lives for exactly one command execution; sessions are
//! not pooled. The hard part is draining the child's two output streams
//! without the classic dual-stream pipe deadlock, which [`channel`] handles
//! with a bounded-wait drain loop.

pub mod channel;
mod session;

pub use channel::drain_child;
pub use session::{CommandOutput, RemoteSession, remote_which};
