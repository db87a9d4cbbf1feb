//! Test support: scripted capture units.
//!
//! `ScriptedCapture` stands in for a real telemetry source in unit and
//! integration tests: it returns a fixed payload, journals which lifecycle
//! phases ran, and can be told to fail in a chosen phase to exercise the
//! stalled-worker paths.

use async_trait::async_trait;
use capmux_proto::{CaptureData, CaptureUnit, Error, Phase, Result};
use std::sync::{Arc, Mutex};

/// Shared journal of lifecycle-phase invocations across capture units.
#[derive(Debug, Clone, Default)]
pub struct PhaseLog(Arc<Mutex<Vec<(String, Phase)>>>);

impl PhaseLog {
    /// Records a phase invocation.
    pub fn record(&self, capture_type: &str, phase: Phase) {
        self.0
            .lock()
            .expect("phase log poisoned")
            .push((capture_type.to_string(), phase));
    }

    /// All recorded (capture type, phase) entries, in invocation order.
    pub fn entries(&self) -> Vec<(String, Phase)> {
        self.0.lock().expect("phase log poisoned").clone()
    }

    /// The recorded phases, in invocation order.
    pub fn phases(&self) -> Vec<Phase> {
        self.entries().into_iter().map(|(_, p)| p).collect()
    }

    /// How many times the given phase was recorded.
    pub fn count(&self, phase: Phase) -> usize {
        self.entries().iter().filter(|(_, p)| *p == phase).count()
    }
}

/// A capture unit with scripted behavior.
#[derive(Debug)]
pub struct ScriptedCapture {
    name: String,
    payload: serde_json::Value,
    fail_at: Option<Phase>,
    log: Option<PhaseLog>,
}

impl ScriptedCapture {
    /// A unit that succeeds in every phase and returns `payload` as data.
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
            fail_at: None,
            log: None,
        }
    }

    /// Makes the given phase fail.
    pub fn fail_at(mut self, phase: Phase) -> Self {
        self.fail_at = Some(phase);
        self
    }

    /// Journals phase invocations into `log`.
    pub fn with_log(mut self, log: PhaseLog) -> Self {
        self.log = Some(log);
        self
    }

    fn run_phase(&self, phase: Phase) -> Result<()> {
        if let Some(log) = &self.log {
            log.record(&self.name, phase);
        }
        if self.fail_at == Some(phase) {
            return Err(Error::capture(format!(
                "scripted failure in {phase} for '{}'",
                self.name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CaptureUnit for ScriptedCapture {
    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&mut self) -> Result<()> {
        self.run_phase(Phase::Setup)
    }

    async fn start(&mut self) -> Result<()> {
        self.run_phase(Phase::Start)
    }

    async fn stop(&mut self) -> Result<()> {
        self.run_phase(Phase::Stop)
    }

    async fn teardown(&mut self) -> Result<()> {
        self.run_phase(Phase::Teardown)
    }

    fn data(&self) -> CaptureData {
        CaptureData::new(&self.name, self.payload.clone())
    }
}
