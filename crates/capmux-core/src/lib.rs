//! # capmux-core
//!
//! The capture orchestration engine for the capmux framework.
//!
//! This crate provides:
//! - The capture matrix builder, expanding multiplexing parameters into the
//!   cartesian product of capture groups
//! - The capture registry mapping type names to unit constructors
//! - The phase barrier and capture workers driven through the
//!   setup/start/stop/teardown lifecycle
//! - The orchestrator that spawns workers, waits for phase convergence, and
//!   aggregates results per group
//! - An explicit persistence hook for run snapshots

mod barrier;
mod config;
mod matrix;
mod orchestrator;
mod persist;
mod registry;
pub mod testing;
mod worker;

pub use barrier::{BarrierGone, PhaseBarrier, PhaseWaiter};
pub use config::OrchestratorConfig;
pub use matrix::build_capture_matrix;
pub use orchestrator::{CaptureOrchestrator, Convergence, GroupSnapshot};
pub use persist::{PersistHook, snapshot_writer};
pub use registry::{CaptureFactory, CaptureRegistry};
