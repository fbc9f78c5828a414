//! The tick window shared by every view that queries a time range.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::types::Tick;

/// Inclusive tick range used to parameterize queries across views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_order"))]
pub struct TimeWindow {
    #[validate(range(min = 0))]
    pub from_tick: Tick,
    pub to_tick: Tick,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            from_tick: 0,
            to_tick: 500,
        }
    }
}

fn validate_order(window: &TimeWindow) -> Result<(), ValidationError> {
    if window.from_tick > window.to_tick {
        return Err(ValidationError::new("from_tick_after_to_tick"));
    }
    Ok(())
}

impl TimeWindow {
    /// Build a validated window.
    pub fn new(from_tick: Tick, to_tick: Tick) -> Result<Self, CoreError> {
        let window = Self { from_tick, to_tick };
        window.validate()?;
        Ok(window)
    }

    /// Number of ticks covered, inclusive of both ends.
    pub fn len(&self) -> Tick {
        self.to_tick - self.from_tick + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 0
    }

    pub fn contains(&self, tick: Tick) -> bool {
        (self.from_tick..=self.to_tick).contains(&tick)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_covers_first_500_ticks() {
        let window = TimeWindow::default();
        assert_eq!((window.from_tick, window.to_tick), (0, 500));
        assert_eq!(window.len(), 501);
    }

    #[test]
    fn reversed_window_is_rejected() {
        assert!(TimeWindow::new(10, 5).is_err());
        assert!(TimeWindow::new(-1, 5).is_err());
        assert!(TimeWindow::new(5, 5).is_ok());
    }

    #[test]
    fn contains_is_inclusive() {
        let window = TimeWindow::new(100, 200).unwrap();
        assert!(window.contains(100));
        assert!(window.contains(200));
        assert!(!window.contains(201));
    }
}
