//! Cosmetic banding applied to values received from the backend.
//!
//! Nothing here derives a health, severity or risk value; bands only pick
//! a label for a number that was already computed server-side.

use std::fmt;

/// Health score at or above which a value is shown as excellent.
pub const EXCELLENT_THRESHOLD: f64 = 90.0;

/// Health score at or above which a value is shown as stable.
pub const STABLE_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthBand {
    Excellent,
    Stable,
    Critical,
}

impl HealthBand {
    pub fn for_score(score: f64) -> Self {
        if score >= EXCELLENT_THRESHOLD {
            HealthBand::Excellent
        } else if score >= STABLE_THRESHOLD {
            HealthBand::Stable
        } else {
            HealthBand::Critical
        }
    }
}

impl fmt::Display for HealthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HealthBand::Excellent => "Excellent",
            HealthBand::Stable => "Stable",
            HealthBand::Critical => "Critical",
        })
    }
}

/// Render a 0-100 score as a fixed-width text gauge, e.g. `[#######...] 72%`.
pub fn gauge(score: f64, width: usize) -> String {
    let clamped = score.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(width - filled),
        clamped.round() as i64
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_split_at_70_and_90() {
        assert_eq!(HealthBand::for_score(95.0), HealthBand::Excellent);
        assert_eq!(HealthBand::for_score(90.0), HealthBand::Excellent);
        assert_eq!(HealthBand::for_score(89.9), HealthBand::Stable);
        assert_eq!(HealthBand::for_score(70.0), HealthBand::Stable);
        assert_eq!(HealthBand::for_score(69.9), HealthBand::Critical);
    }

    #[test]
    fn gauge_clamps_out_of_range_scores() {
        assert_eq!(gauge(150.0, 4), "[####] 100%");
        assert_eq!(gauge(-3.0, 4), "[....]   0%");
        assert_eq!(gauge(50.0, 4), "[##..]  50%");
    }
}
