//! Phase barrier: four one-shot broadcast signals.
//!
//! Each phase signal is set exactly once per orchestration run and stays
//! set, so a late-joining worker still observes it. Signals are issued by
//! the single orchestrator in lifecycle order, which is what gives every
//! worker the same relative phase ordering.

use capmux_proto::Phase;
use tokio::sync::watch;

/// The orchestrator-side handle: signals phases.
#[derive(Debug)]
pub struct PhaseBarrier {
    signals: [watch::Sender<bool>; 4],
}

impl PhaseBarrier {
    /// Creates a barrier with all four phases unsignaled.
    pub fn new() -> Self {
        Self {
            signals: std::array::from_fn(|_| watch::channel(false).0),
        }
    }

    /// Signals a phase. Signaling an already-signaled phase is a no-op.
    ///
    /// Returns true when this call set the signal for the first time.
    pub fn signal(&self, phase: Phase) -> bool {
        let newly = !*self.signals[phase.index()].borrow();
        if newly {
            // send_replace never fails; receivers may come and go.
            self.signals[phase.index()].send_replace(true);
        }
        newly
    }

    /// Returns true if the phase has been signaled.
    pub fn is_signaled(&self, phase: Phase) -> bool {
        *self.signals[phase.index()].borrow()
    }

    /// Creates a worker-side waiter observing all four signals.
    pub fn subscribe(&self) -> PhaseWaiter {
        PhaseWaiter {
            signals: std::array::from_fn(|i| self.signals[i].subscribe()),
        }
    }
}

impl Default for PhaseBarrier {
    fn default() -> Self {
        Self::new()
    }
}

/// The worker-side handle: waits for phase signals.
#[derive(Debug)]
pub struct PhaseWaiter {
    signals: [watch::Receiver<bool>; 4],
}

impl PhaseWaiter {
    /// Waits until the phase is signaled. Resolves immediately when the
    /// signal is already set.
    ///
    /// # Errors
    ///
    /// Fails only when the barrier was dropped before the signal was set,
    /// which means the orchestrator is gone and the worker should exit.
    pub async fn wait(&mut self, phase: Phase) -> Result<(), BarrierGone> {
        self.signals[phase.index()]
            .wait_for(|set| *set)
            .await
            .map(|_| ())
            .map_err(|_| BarrierGone)
    }
}

/// The barrier was dropped with the awaited phase never signaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierGone;
