//! Shared tick window, in memory only.

use std::sync::{PoisonError, RwLock};

use platformops_core::window::TimeWindow;

/// The window views use to parameterize time-range queries.
///
/// Resets to [`TimeWindow::default`] on every start.
#[derive(Debug, Default)]
pub struct TimeWindowState {
    window: RwLock<TimeWindow>,
}

impl TimeWindowState {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window: RwLock::new(window),
        }
    }

    pub fn get(&self) -> TimeWindow {
        *self.window.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, window: TimeWindow) {
        tracing::debug!(from_tick = window.from_tick, to_tick = window.to_tick, "Time window changed");
        *self.window.write().unwrap_or_else(PoisonError::into_inner) = window;
    }

    pub fn reset(&self) {
        self.set(TimeWindow::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_default_and_resets() {
        let state = TimeWindowState::default();
        assert_eq!(state.get(), TimeWindow::default());

        state.set(TimeWindow::new(1000, 2000).unwrap());
        assert_eq!(state.get().from_tick, 1000);

        state.reset();
        assert_eq!(state.get(), TimeWindow::default());
    }
}
