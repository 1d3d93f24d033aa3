//! Pull-to-refresh gesture tracking.
//!
//! A small state machine fed with touch positions. It only decides; the
//! embedding client performs the refresh and calls
//! [`PullToRefresh::finish_refresh`] when done.

/// Pull distance (in progress units) that triggers a refresh.
pub const PULL_THRESHOLD: f64 = 80.0;

/// Progress never exceeds this.
pub const MAX_PROGRESS: f64 = PULL_THRESHOLD * 1.5;

/// Movement beyond which native scrolling is suppressed.
const PREVENT_DEFAULT_AFTER: f64 = 10.0;

/// Result of feeding a move event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    pub progress: f64,
    pub prevent_default: bool,
}

/// Pull-to-refresh tracker.
#[derive(Debug, Clone, Default)]
pub struct PullToRefresh {
    start_y: Option<f64>,
    progress: f64,
    refreshing: bool,
}

impl PullToRefresh {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn progress(&self) -> f64 {
        self.progress
    }

    #[must_use]
    pub const fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Record the gesture start. Ignored unless the view is scrolled to the top.
    pub fn touch_start(&mut self, y: f64, scroll_top: f64) {
        if scroll_top <= 0.0 {
            self.start_y = Some(y);
        }
    }

    pub fn touch_move(&mut self, y: f64, scroll_top: f64) -> MoveOutcome {
        let idle = MoveOutcome {
            progress: self.progress,
            prevent_default: false,
        };

        let Some(start) = self.start_y else {
            return idle;
        };
        if scroll_top > 0.0 || self.refreshing {
            return idle;
        }

        let diff = y - start;
        if diff <= 0.0 {
            return idle;
        }

        self.progress = (diff / 2.0).min(MAX_PROGRESS);
        MoveOutcome {
            progress: self.progress,
            prevent_default: diff > PREVENT_DEFAULT_AFTER,
        }
    }

    /// End the gesture. Returns `true` when a refresh should start.
    pub fn touch_end(&mut self) -> bool {
        self.start_y = None;

        if self.progress >= PULL_THRESHOLD && !self.refreshing {
            self.refreshing = true;
            self.progress = PULL_THRESHOLD;
            true
        } else {
            if !self.refreshing {
                self.progress = 0.0;
            }
            false
        }
    }

    /// Leave the refreshing state.
    pub fn finish_refresh(&mut self) {
        self.refreshing = false;
        self.progress = 0.0;
    }
}
