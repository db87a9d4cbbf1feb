//! Capture unit abstractions.
//!
//! A `CaptureUnit` is a pluggable telemetry source driven through the
//! four-phase lifecycle contract (setup/start/stop/teardown) by a capture
//! worker. Concrete units (disk inventory, benchmark counters, ...) live in
//! downstream crates; the core only consumes this trait.

use crate::{Credentials, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named result payload produced by a capture unit.
///
/// Each entry in a group's result list is tagged with the capture type's
/// identifying name; within a group the tags are unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureData {
    /// The capture type's identifying name.
    pub capture_type: String,

    /// The extracted data.
    pub payload: serde_json::Value,
}

impl CaptureData {
    /// Creates a result payload for the named capture type.
    pub fn new(capture_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            capture_type: capture_type.into(),
            payload,
        }
    }

    /// Creates an error-marker payload for a worker whose capture could not
    /// produce data (authentication or transport failure). The run is not
    /// aborted; other groups continue independently.
    pub fn error(capture_type: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::new(
            capture_type,
            serde_json::json!({ "error": error.to_string() }),
        )
    }

    /// Returns true if this payload carries the error marker.
    pub fn is_error(&self) -> bool {
        self.payload.get("error").is_some()
    }
}

/// Plain construction data handed to a capture unit inside its worker.
///
/// Only values that can cross an execution-context boundary belong here:
/// parameter values and credentials. Anything non-transferable (open
/// connections, buffers) is created by the unit itself after construction.
#[derive(Debug, Clone, Default)]
pub struct CaptureContext {
    /// The capture group's parameter values, merged with any global
    /// construction parameters (group values win on collision).
    pub params: BTreeMap<String, String>,

    /// Credentials for remote interaction, when configured.
    pub credentials: Option<Credentials>,
}

impl CaptureContext {
    /// Looks up a parameter value.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// A pluggable unit of telemetry capture with a four-phase lifecycle.
///
/// # Lifecycle
///
/// 1. **setup**: verify preconditions and prepare anything a normal system
///    would not already have (e.g. check a collector daemon is installed)
/// 2. **start**: begin the collect; interim data stays in memory or on disk,
///    `start` itself returns no data
/// 3. **stop**: end the collect
/// 4. **teardown**: remove any run-specific files or settings
///
/// `data()` turns the raw output of start/stop into the final parsed
/// payload, tagged with [`name()`](Self::name).
///
/// Methods may fail; a failure terminates only the worker driving this unit
/// and leaves its published state stalled, which the orchestrator reports as
/// an incomplete group rather than a failed run.
#[async_trait]
pub trait CaptureUnit: Send {
    /// The capture type's identifying name, used to tag [`CaptureData`].
    fn name(&self) -> &str;

    /// Prepares the unit for capturing.
    async fn setup(&mut self) -> Result<()>;

    /// Starts the capture.
    async fn start(&mut self) -> Result<()>;

    /// Stops the capture.
    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    /// Removes run-specific state.
    async fn teardown(&mut self) -> Result<()> {
        Ok(())
    }

    /// The parsed result payload.
    fn data(&self) -> CaptureData;
}
