//! Worker lifecycle states and phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four orchestration phases, signaled exactly once per run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Start,
    Stop,
    Teardown,
}

impl Phase {
    /// All phases in signal order.
    pub const ALL: [Phase; 4] = [Phase::Setup, Phase::Start, Phase::Stop, Phase::Teardown];

    /// The state every worker publishes after completing this phase.
    pub fn target_state(self) -> WorkerState {
        match self {
            Phase::Setup => WorkerState::SetUp,
            Phase::Start => WorkerState::Started,
            Phase::Stop => WorkerState::Stopped,
            Phase::Teardown => WorkerState::TornDown,
        }
    }

    /// Index into phase-ordered storage.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Start => "start",
            Phase::Stop => "stop",
            Phase::Teardown => "teardown",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A worker's current lifecycle position.
///
/// Strictly monotonic per worker: the derived `Ord` follows the lifecycle
/// order, so observers can assert that a worker never moves backwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Spawned, waiting for the setup signal.
    Initializing,
    /// `setup()` completed.
    SetUp,
    /// `start()` completed, capture in progress.
    Started,
    /// `stop()` completed and the result was published.
    Stopped,
    /// `teardown()` completed; terminal.
    TornDown,
}

impl WorkerState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkerState::Initializing => "initializing",
            WorkerState::SetUp => "set_up",
            WorkerState::Started => "started",
            WorkerState::Stopped => "stopped",
            WorkerState::TornDown => "torn_down",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
