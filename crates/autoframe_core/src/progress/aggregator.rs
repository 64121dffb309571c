//! Displayed-vs-target progress with a drift animation.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Displayed progress never drifts past this without a real 100% target.
pub const DRIFT_CEILING: f64 = 98.0;

/// Target set when a run begins, so the bar visibly moves right away.
pub const INITIAL_TARGET: f64 = 6.0;

/// Smallest step taken toward the target per tick.
const MIN_STEP: f64 = 0.6;

/// Share of the remaining gap covered per tick.
const GAP_FACTOR: f64 = 0.25;

/// How far past the target drift may go.
const DRIFT_HEADROOM: f64 = 10.0;

/// Drift increments, cycled so the motion looks uneven but stays reproducible.
const DRIFT_STEPS: [f64; 5] = [0.2, 0.9, 0.5, 1.6, 0.7];

/// Point-in-time copy of the progress state.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub displayed: f64,
    pub target: f64,
    pub title: String,
    pub subtitle: String,
}

/// Receives every change to the displayed state.
pub type ProgressListener = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

#[derive(Debug, Default)]
struct ProgressState {
    displayed: f64,
    target: f64,
    title: String,
    subtitle: String,
    drift_index: usize,
}

impl ProgressState {
    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            displayed: self.displayed,
            target: self.target,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
        }
    }

    fn is_finished(&self) -> bool {
        self.displayed >= 100.0 && self.target >= 100.0
    }

    /// One animation step. Returns whether ticking should continue.
    fn advance(&mut self) -> bool {
        if self.displayed < self.target {
            let step = MIN_STEP.max((self.target - self.displayed) * GAP_FACTOR);
            self.displayed = (self.displayed + step).min(self.target);
        } else if self.displayed < DRIFT_CEILING {
            let cap = (self.target + DRIFT_HEADROOM).min(DRIFT_CEILING);
            if self.displayed < cap {
                let drift = DRIFT_STEPS[self.drift_index % DRIFT_STEPS.len()];
                self.drift_index += 1;
                self.displayed = (self.displayed + drift).min(cap);
            }
        }
        self.displayed = self.displayed.min(100.0);
        !self.is_finished()
    }
}

/// Aggregates progress from every source of a batch run.
///
/// Cheap to share behind an `Arc`; all methods take `&self`.
pub struct ProgressAggregator {
    state: Arc<Mutex<ProgressState>>,
    listener: Option<ProgressListener>,
    tick_interval: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressAggregator {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(ProgressState::default())),
            listener: None,
            tick_interval,
            ticker: Mutex::new(None),
        }
    }

    /// Set the listener notified on every change.
    pub fn with_listener(mut self, listener: ProgressListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.lock().snapshot()
    }

    pub fn displayed(&self) -> f64 {
        self.state.lock().displayed
    }

    pub fn target(&self) -> f64 {
        self.state.lock().target
    }

    /// Raise the target (never lowers it) and update the caption.
    ///
    /// A target of 100 bumps the displayed value to at least 98 at once.
    pub fn set_target(&self, percent: f64, title: &str, subtitle: &str) {
        let snapshot = {
            let mut state = self.state.lock();
            let percent = if percent.is_finite() { percent.clamp(0.0, 100.0) } else { 0.0 };
            state.target = state.target.max(percent);
            if percent >= 100.0 {
                state.displayed = state.displayed.max(DRIFT_CEILING);
            }
            state.title = title.to_string();
            state.subtitle = subtitle.to_string();
            state.snapshot()
        };
        self.notify(&snapshot);
    }

    /// Advance the displayed value by one tick. Returns whether ticking
    /// should continue.
    pub fn tick(&self) -> bool {
        let (keep_going, snapshot) = {
            let mut state = self.state.lock();
            let keep_going = state.advance();
            (keep_going, state.snapshot())
        };
        self.notify(&snapshot);
        keep_going
    }

    /// Reset to a fresh run and start animating.
    pub fn begin(&self, title: &str, subtitle: &str) {
        self.stop_animation();
        {
            let mut state = self.state.lock();
            *state = ProgressState::default();
        }
        self.set_target(INITIAL_TARGET, title, subtitle);
        self.start_animation();
    }

    /// Mark the run complete: both values at 100, ticking stopped.
    pub fn finalize(&self, title: &str, subtitle: &str) {
        self.stop_animation();
        let snapshot = {
            let mut state = self.state.lock();
            state.target = 100.0;
            state.displayed = 100.0;
            state.title = title.to_string();
            state.subtitle = subtitle.to_string();
            state.snapshot()
        };
        self.notify(&snapshot);
    }

    /// Zero both values and stop ticking.
    pub fn reset(&self) {
        self.stop_animation();
        let snapshot = {
            let mut state = self.state.lock();
            *state = ProgressState::default();
            state.snapshot()
        };
        self.notify(&snapshot);
    }

    /// Start the fixed-interval tick task if it is not already running.
    ///
    /// Needs a Tokio runtime; outside one the call is a no-op.
    pub fn start_animation(&self) {
        let mut ticker = self.ticker.lock();
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime, progress animation disabled");
            return;
        };

        let state = Arc::clone(&self.state);
        let listener = self.listener.clone();
        let period = self.tick_interval;
        *ticker = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                let (keep_going, snapshot) = {
                    let mut state = state.lock();
                    let keep_going = state.advance();
                    (keep_going, state.snapshot())
                };
                if let Some(listener) = &listener {
                    listener(&snapshot);
                }
                if !keep_going {
                    break;
                }
            }
        }));
    }

    /// Stop the tick task, if any.
    pub fn stop_animation(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
    }

    pub fn is_animating(&self) -> bool {
        self.ticker
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start animating; the animation stops when the guard is dropped.
    pub fn animate(&self) -> AnimationGuard<'_> {
        self.start_animation();
        AnimationGuard { aggregator: self }
    }

    fn notify(&self, snapshot: &ProgressSnapshot) {
        if let Some(listener) = &self.listener {
            listener(snapshot);
        }
    }
}

impl Default for ProgressAggregator {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

impl Drop for ProgressAggregator {
    fn drop(&mut self) {
        self.stop_animation();
    }
}

/// Stops the tick task when dropped, on every exit path.
pub struct AnimationGuard<'a> {
    aggregator: &'a ProgressAggregator,
}

impl Drop for AnimationGuard<'_> {
    fn drop(&mut self) {
        self.aggregator.stop_animation();
    }
}
