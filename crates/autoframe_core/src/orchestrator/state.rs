//! Batch lifecycle phases.

use std::fmt;

use parking_lot::Mutex;

/// Where a batch run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPhase {
    #[default]
    Idle,
    Validating,
    NamingResolution,
    Dispatching,
    Running,
    Finalizing,
    Completed,
    PartiallyFailed,
    Failed,
}

impl BatchPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchPhase::Completed | BatchPhase::PartiallyFailed | BatchPhase::Failed
        )
    }

    /// Whether a run is in flight.
    pub fn is_active(&self) -> bool {
        !self.is_terminal() && *self != BatchPhase::Idle
    }

    pub fn can_transition_to(&self, next: BatchPhase) -> bool {
        use BatchPhase::*;
        // Reset is always allowed.
        if next == Idle {
            return true;
        }
        match self {
            Idle => next == Validating,
            Validating => matches!(next, NamingResolution | Failed),
            NamingResolution => matches!(next, Dispatching | Failed),
            Dispatching => matches!(next, Running | Failed),
            // Running may go back to Dispatching when a strategy hands over to a fallback.
            Running => matches!(next, Dispatching | Finalizing | Failed),
            Finalizing => matches!(next, Completed | PartiallyFailed | Failed),
            Completed | PartiallyFailed | Failed => next == Validating,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BatchPhase::Idle => "Idle",
            BatchPhase::Validating => "Validating",
            BatchPhase::NamingResolution => "Naming resolution",
            BatchPhase::Dispatching => "Dispatching",
            BatchPhase::Running => "Running",
            BatchPhase::Finalizing => "Finalizing",
            BatchPhase::Completed => "Completed",
            BatchPhase::PartiallyFailed => "Partially failed",
            BatchPhase::Failed => "Failed",
        }
    }
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared current phase with checked transitions.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    phase: Mutex<BatchPhase>,
}

impl PhaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> BatchPhase {
        *self.phase.lock()
    }

    /// Move to `next` if the transition is allowed. Returns whether it happened.
    pub fn advance(&self, next: BatchPhase) -> bool {
        let mut phase = self.phase.lock();
        if !phase.can_transition_to(next) {
            tracing::warn!("Ignoring batch phase change {} -> {}", *phase, next);
            return false;
        }
        tracing::debug!("Batch phase {} -> {}", *phase, next);
        *phase = next;
        true
    }

    pub fn reset(&self) {
        *self.phase.lock() = BatchPhase::Idle;
    }
}
