//! Alert rules, alert events and the per-severity summary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DbId, Tick};

/// Alert event status filter value for currently open events.
pub const STATUS_OPEN: &str = "OPEN";

/// A trigger condition evaluated by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub id: DbId,
    pub signal_code: String,
    pub operator: String,
    pub threshold: f64,
    pub min_duration_ticks: i64,
    pub severity: String,
    pub enabled: bool,
}

/// A single firing of an [`AlertRule`] over a tick interval.
///
/// Older backends omit most descriptive fields, so everything beyond the
/// identifiers is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: DbId,
    pub rule_id: DbId,
    #[serde(default)]
    pub component_code: Option<String>,
    #[serde(default)]
    pub signal_code: Option<String>,
    #[serde(default)]
    pub tick_start: Option<Tick>,
    /// Absent while the event is still open.
    #[serde(default)]
    pub tick_end: Option<Tick>,
    #[serde(default)]
    pub peak_value: Option<f64>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
}

impl AlertEvent {
    /// An event is open until the backend records its closing tick.
    pub fn is_open(&self) -> bool {
        self.tick_end.is_none()
    }

    /// Length of the closed interval in ticks, inclusive of both ends.
    pub fn duration_ticks(&self) -> Option<Tick> {
        match (self.tick_start, self.tick_end) {
            (Some(start), Some(end)) => Some(end - start + 1),
            _ => None,
        }
    }
}

/// Count of alert events per severity, as returned by `/api/alerts/summary`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertSummary(pub BTreeMap<String, i64>);

impl AlertSummary {
    /// Count for a severity, `0` when the backend did not report it.
    pub fn count(&self, severity: &str) -> i64 {
        self.0.get(severity).copied().unwrap_or(0)
    }

    pub fn critical(&self) -> i64 {
        self.count("critical")
    }

    pub fn warning(&self) -> i64 {
        self.count("warning")
    }

    pub fn info(&self) -> i64 {
        self.count("info")
    }
}

/// Body of `POST /api/alerts/evaluate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvaluateRequest {
    pub lookback_ticks: i64,
    pub simulation_mode: bool,
}

impl Default for EvaluateRequest {
    fn default() -> Self {
        Self {
            lookback_ticks: 200,
            simulation_mode: false,
        }
    }
}

/// Body of `POST /api/alerts/reset-and-evaluate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResetEvaluateRequest {
    pub lookback_ticks: i64,
}

impl Default for ResetEvaluateRequest {
    fn default() -> Self {
        Self { lookback_ticks: 200 }
    }
}

/// Result of `POST /api/alerts/rules/generate-all`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneratedRules {
    #[serde(default)]
    pub created_rules: i64,
    #[serde(default)]
    pub strategy: Option<String>,
}
