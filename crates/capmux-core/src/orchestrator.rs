//! Capture orchestrator.
//!
//! Builds the capture matrix, spawns one worker per (capture group, capture
//! type), drives all workers through the synchronized
//! setup/start/stop/teardown phases, and aggregates results per group.
//!
//! A run with `M` capture groups and `K` capture types spawns exactly
//! `M * K` workers; after full convergence each group's result list holds
//! `K` entries, each uniquely tagged by its capture type's name.

use crate::barrier::PhaseBarrier;
use crate::config::OrchestratorConfig;
use crate::matrix::build_capture_matrix;
use crate::persist::PersistHook;
use crate::registry::{CaptureFactory, CaptureRegistry};
use crate::worker::{self, WorkerHandle, WorkerSpec};
use capmux_proto::{
    CaptureContext, CaptureData, Credentials, Error, MultiParams, Phase, Result, WorkerState,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Outcome of a phase trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// All workers reached the phase's target state.
    Complete,
    /// The timeout elapsed with `lagging` workers short of the target
    /// state. Advisory: workers are not cancelled and may still arrive.
    TimedOut { lagging: usize },
    /// The phase was signaled without waiting for convergence.
    Signaled,
}

impl Convergence {
    /// Returns true when every worker reached the target state.
    pub fn is_complete(self) -> bool {
        matches!(self, Convergence::Complete)
    }
}

/// Read-only view of one capture group and its results so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSnapshot {
    /// The group's parameter combination.
    pub params: BTreeMap<String, String>,

    /// Results drained so far, tagged by capture type.
    pub results: Vec<CaptureData>,

    /// True when every requested capture type has delivered a result.
    pub complete: bool,
}

/// One capture group at run time: the parameter combination, its dedicated
/// result channel, and the results drained so far.
struct GroupSlot {
    params: BTreeMap<String, String>,
    results: Vec<CaptureData>,
    result_tx: mpsc::Sender<CaptureData>,
    result_rx: mpsc::Receiver<CaptureData>,
}

/// Drives capture workers through the four-phase lifecycle.
pub struct CaptureOrchestrator {
    config: OrchestratorConfig,
    captures: Vec<(String, CaptureFactory)>,
    groups: Vec<GroupSlot>,
    barrier: PhaseBarrier,
    workers: Vec<WorkerHandle>,
    credentials: Option<Credentials>,
    global_params: BTreeMap<String, String>,
    persist: Option<PersistHook>,
}

impl CaptureOrchestrator {
    /// Builds an orchestrator for the requested capture types over the
    /// multiplexing parameter matrix.
    ///
    /// All configuration problems surface here, before any worker exists:
    /// an empty capture-type list or empty parameter domain is
    /// [`Error::InvalidConfiguration`], an unresolvable type name is
    /// [`Error::UnknownCaptureType`].
    pub fn new(
        registry: &CaptureRegistry,
        capture_types: &[&str],
        multi_params: &MultiParams,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        if capture_types.is_empty() {
            return Err(Error::invalid_config("no capture types requested"));
        }
        let captures = registry.resolve(capture_types)?;
        let matrix = build_capture_matrix(multi_params)?;

        debug!(
            capture_types = ?capture_types,
            groups = matrix.len(),
            "built capture matrix"
        );

        let groups = matrix
            .into_iter()
            .map(|params| {
                // One result per capture type, so the channel never fills.
                let (result_tx, result_rx) = mpsc::channel(captures.len());
                GroupSlot {
                    params,
                    results: Vec::new(),
                    result_tx,
                    result_rx,
                }
            })
            .collect();

        Ok(Self {
            config,
            captures,
            groups,
            barrier: PhaseBarrier::new(),
            workers: Vec::new(),
            credentials: None,
            global_params: BTreeMap::new(),
            persist: None,
        })
    }

    /// Credentials copied into every worker's capture context.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Global construction parameters merged into every worker's context.
    /// A group's own parameter value wins on key collision.
    pub fn with_global_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.global_params = params;
        self
    }

    /// Registers a hook invoked with a fresh snapshot after every
    /// externally visible mutation (phase trigger, result drain).
    pub fn set_persist_hook<F>(&mut self, hook: F)
    where
        F: Fn(&[GroupSnapshot]) + Send + 'static,
    {
        self.persist = Some(Box::new(hook));
    }

    /// Number of capture groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of spawned workers (zero before `setup`).
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Current state of every spawned worker.
    pub fn worker_states(&self) -> Vec<WorkerState> {
        self.workers.iter().map(WorkerHandle::current_state).collect()
    }

    /// Spawns all workers (first call only), signals the setup phase, and
    /// optionally waits for convergence.
    pub async fn setup(&mut self, wait: bool, timeout: Duration) -> Convergence {
        if self.workers.is_empty() {
            self.spawn_workers();
        }
        self.trigger(Phase::Setup, wait, timeout).await
    }

    /// Signals the start phase.
    pub async fn start(&mut self, wait: bool, timeout: Duration) -> Convergence {
        self.trigger(Phase::Start, wait, timeout).await
    }

    /// Signals the stop phase. On convergence every group's result is
    /// already queued in its channel.
    pub async fn stop(&mut self, wait: bool, timeout: Duration) -> Convergence {
        self.trigger(Phase::Stop, wait, timeout).await
    }

    /// Signals the teardown phase.
    pub async fn teardown(&mut self, wait: bool, timeout: Duration) -> Convergence {
        self.trigger(Phase::Teardown, wait, timeout).await
    }

    /// Drains each group's result channel into its result list and returns
    /// a snapshot of all groups.
    ///
    /// The snapshot may be partial: a group whose worker stalled reports
    /// `complete == false`. Completeness must be checked here rather than
    /// inferred from the absence of an error.
    pub fn result_data(&mut self) -> Vec<GroupSnapshot> {
        let expected = self.captures.len();
        for group in &mut self.groups {
            while let Ok(data) = group.result_rx.try_recv() {
                group.results.push(data);
            }
        }

        let snapshot: Vec<GroupSnapshot> = self
            .groups
            .iter()
            .map(|group| GroupSnapshot {
                params: group.params.clone(),
                results: group.results.clone(),
                complete: group.results.len() == expected,
            })
            .collect();

        for group in &snapshot {
            info!(
                target: "capmux::results",
                params = ?group.params,
                results = group.results.len(),
                complete = group.complete,
                "group results"
            );
        }

        if let Some(persist) = &self.persist {
            persist(&snapshot);
        }
        snapshot
    }

    fn spawn_workers(&mut self) {
        for (group_index, group) in self.groups.iter().enumerate() {
            for (capture_type, factory) in &self.captures {
                let mut params = self.global_params.clone();
                params.extend(group.params.clone());
                let context = CaptureContext {
                    params,
                    credentials: self.credentials.clone(),
                };

                let handle = worker::spawn(WorkerSpec {
                    capture_type: capture_type.clone(),
                    group_index,
                    factory: factory.clone(),
                    context,
                    waiter: self.barrier.subscribe(),
                    results: group.result_tx.clone(),
                });
                debug!(capture_type = capture_type.as_str(), group = group_index, "spawned capture worker");
                self.workers.push(handle);
            }
        }
        info!(
            workers = self.workers.len(),
            groups = self.groups.len(),
            captures = self.captures.len(),
            "spawned capture workers"
        );
    }

    async fn trigger(&mut self, phase: Phase, wait: bool, timeout: Duration) -> Convergence {
        if self.barrier.signal(phase) {
            debug!(%phase, "signaled phase");
        } else {
            debug!(%phase, "phase already signaled");
        }

        let convergence = if wait {
            self.wait_for_state(phase.target_state(), timeout).await
        } else {
            Convergence::Signaled
        };

        if let Some(persist) = &self.persist {
            let snapshot = self.snapshot_without_drain();
            persist(&snapshot);
        }
        convergence
    }

    /// Polls worker states until all collapse to `target` or the deadline
    /// passes. The timeout is a hard upper bound on the wait, but soft for
    /// the run: lagging workers are not cancelled.
    async fn wait_for_state(&self, target: WorkerState, timeout: Duration) -> Convergence {
        let deadline = Instant::now() + timeout;
        loop {
            let states: HashSet<WorkerState> = self
                .workers
                .iter()
                .map(WorkerHandle::current_state)
                .collect();
            debug!(?states, %target, "observed worker states");

            if states.len() == 1 && states.contains(&target) {
                return Convergence::Complete;
            }

            let now = Instant::now();
            if now >= deadline {
                let lagging = self
                    .workers
                    .iter()
                    .filter(|w| w.current_state() != target)
                    .count();
                warn!(
                    %target,
                    lagging,
                    timeout_ms = timeout.as_millis() as u64,
                    "hit timeout waiting for all captures to reach state"
                );
                return Convergence::TimedOut { lagging };
            }

            let interval = self.config.poll_interval().min(deadline - now);
            tokio::time::sleep(interval).await;
        }
    }

    /// Snapshot of current result lists without touching the channels;
    /// used for persist-hook notifications on phase triggers.
    fn snapshot_without_drain(&self) -> Vec<GroupSnapshot> {
        let expected = self.captures.len();
        self.groups
            .iter()
            .map(|group| GroupSnapshot {
                params: group.params.clone(),
                results: group.results.clone(),
                complete: group.results.len() == expected,
            })
            .collect()
    }
}

impl std::fmt::Debug for CaptureOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureOrchestrator")
            .field("captures", &self.captures.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("groups", &self.groups.len())
            .field("workers", &self.workers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedCapture;
    use serde_json::json;

    fn registry_with(names: &[&str]) -> CaptureRegistry {
        let mut registry = CaptureRegistry::new();
        for name in names {
            let name = name.to_string();
            registry.register(name.clone(), move |_ctx| {
                Ok(Box::new(ScriptedCapture::new(name.clone(), json!({"ok": true}))))
            });
        }
        registry
    }

    #[test]
    fn test_empty_capture_list_rejected() {
        let registry = registry_with(&["a"]);
        let err = CaptureOrchestrator::new(
            &registry,
            &[],
            &MultiParams::new(),
            OrchestratorConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)));
    }

    #[test]
    fn test_unknown_capture_type_rejected_before_spawn() {
        let registry = registry_with(&["a"]);
        let err = CaptureOrchestrator::new(
            &registry,
            &["a", "missing"],
            &MultiParams::new(),
            OrchestratorConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownCaptureType(_)));
    }

    #[test]
    fn test_group_count_follows_matrix() {
        let registry = registry_with(&["a", "b"]);
        let params = MultiParams::new()
            .with("host", ["h1", "h2"])
            .with("disk", ["sda", "sdb", "sdc"]);
        let orch = CaptureOrchestrator::new(
            &registry,
            &["a", "b"],
            &params,
            OrchestratorConfig::default(),
        )
        .unwrap();

        assert_eq!(orch.group_count(), 6);
        assert_eq!(orch.worker_count(), 0); // nothing spawned before setup
    }
}
