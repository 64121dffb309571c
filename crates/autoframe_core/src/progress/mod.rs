//! Single smooth progress signal for a batch run.
//!
//! Real progress arrives from very different sources (upload byte counts,
//! server polls, encoder callbacks) and is often coarse. Sources push a
//! *target* with [`ProgressAggregator::set_target`]; a fixed-interval tick
//! moves the *displayed* value toward it and drifts slowly while waiting.

mod aggregator;

pub use aggregator::{
    AnimationGuard, ProgressAggregator, ProgressListener, ProgressSnapshot, DRIFT_CEILING,
    INITIAL_TARGET,
};

/// Overall percent for `processed` whole units plus a fraction of the one in flight.
///
/// `total` of zero is treated as one, so the result is always finite.
pub fn combine_overall(processed: usize, partial: f64, total: usize) -> f64 {
    let partial = if partial.is_finite() { partial } else { 0.0 };
    let ratio = (processed as f64 + partial) / total.max(1) as f64;
    ratio.clamp(0.0, 1.0) * 100.0
}

/// A slice of the 0-100 scale reserved for one sub-phase of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressBand {
    pub start: f64,
    pub end: f64,
}

impl ProgressBand {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Map a 0-100 percent within the band onto the full scale.
    pub fn map(&self, percent: f64) -> f64 {
        let fraction = (percent / 100.0).clamp(0.0, 1.0);
        self.start + (self.end - self.start) * fraction
    }
}
