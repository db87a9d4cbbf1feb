//! Capture worker: one isolated execution context per (group, capture type).
//!
//! The worker advances through the lifecycle state machine on barrier
//! signals: wait for the phase signal, invoke the matching capture-unit
//! method, publish the new state. Waits are unbounded; only the
//! orchestrator's convergence wait is bounded.
//!
//! The capture unit is constructed *inside* the task, after the setup
//! signal, from the registered factory. A non-transferable resource must
//! never be handed across the worker boundary, so only plain data (the
//! [`CaptureContext`]) comes in.
//!
//! A failure in any phase ends the task and leaves the state cell stalled
//! at its last published value; the orchestrator's convergence wait times
//! out for that worker and the group is reported incomplete.

use crate::barrier::PhaseWaiter;
use crate::registry::CaptureFactory;
use capmux_proto::{CaptureContext, CaptureData, Phase, WorkerState};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Everything a worker needs at spawn time. Plain data plus cloneable
/// channel handles only.
pub(crate) struct WorkerSpec {
    pub capture_type: String,
    pub group_index: usize,
    pub factory: CaptureFactory,
    pub context: CaptureContext,
    pub waiter: PhaseWaiter,
    pub results: mpsc::Sender<CaptureData>,
}

/// Orchestrator-side handle to a spawned worker.
pub(crate) struct WorkerHandle {
    pub capture_type: String,
    pub group_index: usize,
    pub state: watch::Receiver<WorkerState>,
    #[allow(dead_code)] // held so the task handle is not detached
    pub task: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn current_state(&self) -> WorkerState {
        *self.state.borrow()
    }
}

/// Spawns a worker task and returns its handle.
pub(crate) fn spawn(spec: WorkerSpec) -> WorkerHandle {
    let (state_tx, state_rx) = watch::channel(WorkerState::Initializing);
    let capture_type = spec.capture_type.clone();
    let group_index = spec.group_index;
    let task = tokio::spawn(run(spec, state_tx));

    WorkerHandle {
        capture_type,
        group_index,
        state: state_rx,
        task,
    }
}

async fn run(mut spec: WorkerSpec, state: watch::Sender<WorkerState>) {
    let capture_type = spec.capture_type.as_str();

    if spec.waiter.wait(Phase::Setup).await.is_err() {
        debug!(capture_type, "barrier dropped before setup, exiting worker");
        return;
    }
    let mut unit = match (spec.factory)(&spec.context) {
        Ok(unit) => unit,
        Err(e) => {
            error!(capture_type, group = spec.group_index, "failed to construct capture unit: {e}");
            return;
        }
    };
    if let Err(e) = unit.setup().await {
        error!(capture_type, group = spec.group_index, "setup failed: {e}");
        return;
    }
    state.send_replace(WorkerState::SetUp);
    debug!(capture_type, group = spec.group_index, "worker set up");

    if spec.waiter.wait(Phase::Start).await.is_err() {
        return;
    }
    if let Err(e) = unit.start().await {
        error!(capture_type, group = spec.group_index, "start failed: {e}");
        return;
    }
    state.send_replace(WorkerState::Started);

    if spec.waiter.wait(Phase::Stop).await.is_err() {
        return;
    }
    if let Err(e) = unit.stop().await {
        error!(capture_type, group = spec.group_index, "stop failed: {e}");
        return;
    }
    // Publish the result before the state so convergence on the stop phase
    // implies the data is already drainable from the group channel.
    let data = unit.data();
    debug!(capture_type, group = spec.group_index, "publishing capture result");
    if spec.results.send(data).await.is_err() {
        debug!(capture_type, "result channel closed, discarding result");
    }
    state.send_replace(WorkerState::Stopped);

    if spec.waiter.wait(Phase::Teardown).await.is_err() {
        return;
    }
    if let Err(e) = unit.teardown().await {
        error!(capture_type, group = spec.group_index, "teardown failed: {e}");
        return;
    }
    state.send_replace(WorkerState::TornDown);
    debug!(capture_type, group = spec.group_index, "worker torn down");
}
