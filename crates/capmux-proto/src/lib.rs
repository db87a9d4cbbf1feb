//! # capmux-proto
//!
//! Shared types, error definitions, and traits for the capmux capture
//! orchestration framework.
//!
//! This crate provides the foundational abstractions used across all capmux
//! crates, including:
//! - The `CaptureUnit` four-phase lifecycle trait and its `CaptureData` payload
//! - Multiplexing parameters for building capture matrices
//! - Credentials for remote command execution
//! - Worker lifecycle states and phases
//! - Common error types

mod capture;
mod credentials;
mod error;
mod params;
mod state;

pub use capture::{CaptureContext, CaptureData, CaptureUnit};
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use params::MultiParams;
pub use state::{Phase, WorkerState};
