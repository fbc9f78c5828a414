//! Anomaly injection requests and the backend's anomaly reports.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::error::CoreError;
use crate::types::Tick;

/// Anomaly kinds the simulator knows how to inject.
pub const ANOMALY_TYPES: [&str; 5] = [
    "cpu_saturation",
    "error_spike",
    "latency_regression",
    "event_storm",
    "backlog_growth",
];

/// Pipelines an anomaly can be injected into.
pub const PIPELINES: [&str; 2] = ["stream_lane", "rail"];

/// Parameters of `POST /api/anomalies/inject`, sent as query parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[validate(schema(function = "validate_tick_range"))]
pub struct AnomalyInjection {
    #[validate(length(min = 1))]
    pub pipeline: String,
    #[validate(length(min = 1))]
    pub anomaly_type: String,
    #[validate(range(min = 0))]
    pub from_tick: Tick,
    pub to_tick: Tick,
    /// `1.0` is normal strength; omitted from the request when `None`.
    #[validate(range(min = 0.1, max = 5.0))]
    pub strength: Option<f64>,
}

impl Default for AnomalyInjection {
    fn default() -> Self {
        Self {
            pipeline: "stream_lane".into(),
            anomaly_type: "backlog_growth".into(),
            from_tick: 100,
            to_tick: 200,
            strength: Some(1.0),
        }
    }
}

fn validate_tick_range(injection: &AnomalyInjection) -> Result<(), ValidationError> {
    if injection.from_tick > injection.to_tick {
        return Err(ValidationError::new("from_tick_after_to_tick"));
    }
    Ok(())
}

impl AnomalyInjection {
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()?;
        Ok(())
    }
}

/// Result of an injection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct InjectionResult {
    #[serde(default)]
    pub affected_points: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveAnomaly {
    pub anomaly_type: String,
    #[serde(default)]
    pub pipeline: Option<String>,
    #[serde(default)]
    pub component_code: Option<String>,
    pub from_tick: Tick,
    /// `None` while the anomaly is ongoing.
    #[serde(default)]
    pub to_tick: Option<Tick>,
    #[serde(default)]
    pub points_modified: Option<i64>,
}

/// `GET /api/anomalies/active`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveAnomalies {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub total_points_modified: i64,
    #[serde(default)]
    pub affected_components: Vec<String>,
    #[serde(default)]
    pub anomalies: Vec<ActiveAnomaly>,
}

impl ActiveAnomalies {
    /// The anomaly views display; only one is expected at a time.
    pub fn current(&self) -> Option<&ActiveAnomaly> {
        if self.active {
            self.anomalies.first()
        } else {
            None
        }
    }

    /// Tick window of the current anomaly, for chart shading.
    pub fn window(&self) -> Option<(Tick, Tick)> {
        self.current()
            .map(|a| (a.from_tick, a.to_tick.unwrap_or(a.from_tick)))
    }
}

/// Backend global health: a collapse risk in `0.0..=1.0` and its status
/// (`STABLE`, `DEGRADED` or `CRITICAL`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalHealthState {
    #[serde(default)]
    pub collapse_risk: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyWindow {
    pub from_tick: Tick,
    pub to_tick: Tick,
    #[serde(default)]
    pub duration_ticks: Option<i64>,
}

impl AnomalyWindow {
    /// Inclusive duration, computed when the backend leaves it out.
    pub fn duration(&self) -> i64 {
        self.duration_ticks
            .unwrap_or(self.to_tick - self.from_tick + 1)
    }
}

/// The anomaly an impact or analysis report is about.
///
/// Impact reports carry the tick range inline; analysis reports nest it
/// under `window`. [`AnomalyContext::window`] reads either.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnomalyContext {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type", alias = "anomaly_type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub pipeline: Option<String>,
    #[serde(rename = "window", default)]
    pub nested_window: Option<AnomalyWindow>,
    #[serde(default)]
    pub from_tick: Option<Tick>,
    #[serde(default)]
    pub to_tick: Option<Tick>,
    #[serde(default)]
    pub duration_ticks: Option<i64>,
    #[serde(default)]
    pub affected_components: Vec<String>,
    #[serde(default)]
    pub affected_signals: Option<i64>,
    #[serde(default)]
    pub points_modified: Option<i64>,
    #[serde(default)]
    pub expected_behavior: Vec<String>,
}

impl AnomalyContext {
    pub fn window(&self) -> Option<AnomalyWindow> {
        self.nested_window.or(match (self.from_tick, self.to_tick) {
            (Some(from_tick), Some(to_tick)) => Some(AnomalyWindow {
                from_tick,
                to_tick,
                duration_ticks: self.duration_ticks,
            }),
            _ => None,
        })
    }
}

/// Open simulated alerts raised during the anomaly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertImpact {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub by_severity: BTreeMap<String, i64>,
    #[serde(default)]
    pub by_component: BTreeMap<String, i64>,
}

/// An affected component, weakest first as sorted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentImpact {
    pub component_code: String,
    #[serde(default)]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub open_alerts: i64,
    #[serde(default)]
    pub severity_pressure: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDeviation {
    pub signal_code: String,
    #[serde(default)]
    pub avg_delta_pct: f64,
    #[serde(default)]
    pub max_delta_pct: f64,
}

/// `GET /api/anomalies/impact`.
///
/// The backend reports `anomaly`, `alerts`, `components`,
/// `metric_deviation` and `global_health`. Older payloads flatten these
/// into `simulated_alerts_count`, `by_severity`, `most_impacted_components`
/// and `global_health_during_anomaly`; the accessors read whichever is
/// present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnomalyImpact {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub anomaly: Option<AnomalyContext>,
    #[serde(default)]
    pub alerts: Option<AlertImpact>,
    #[serde(default)]
    pub components: Vec<ComponentImpact>,
    #[serde(default)]
    pub metric_deviation: Vec<MetricDeviation>,
    #[serde(default)]
    pub global_health: Option<GlobalHealthState>,

    #[serde(default)]
    pub simulated_alerts_count: Option<i64>,
    #[serde(default)]
    pub by_severity: BTreeMap<String, i64>,
    #[serde(default)]
    pub most_impacted_components: Vec<String>,
    #[serde(default)]
    pub global_health_during_anomaly: Option<f64>,
}

impl AnomalyImpact {
    pub fn alert_count(&self) -> Option<i64> {
        self.alerts
            .as_ref()
            .map(|a| a.total)
            .or(self.simulated_alerts_count)
    }

    pub fn alerts_by_severity(&self) -> &BTreeMap<String, i64> {
        match &self.alerts {
            Some(alerts) => &alerts.by_severity,
            None => &self.by_severity,
        }
    }

    /// Impacted component codes in the order the backend sent them.
    pub fn impacted_components(&self) -> Vec<&str> {
        if self.components.is_empty() {
            self.most_impacted_components.iter().map(String::as_str).collect()
        } else {
            self.components.iter().map(|c| c.component_code.as_str()).collect()
        }
    }
}

/// One row of the analysis health ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedComponent {
    pub component_code: String,
    #[serde(default)]
    pub component_label: Option<String>,
    #[serde(default)]
    pub open_alerts: i64,
    #[serde(default)]
    pub health_score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSection {
    #[serde(default)]
    pub components_ranked: Vec<RankedComponent>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemState {
    #[serde(default)]
    pub global_health: Option<GlobalHealthState>,
    #[serde(default)]
    pub cascading_behavior: bool,
}

/// An analysis observation: typed (`{type, message}`) or free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Observation {
    Typed {
        #[serde(rename = "type")]
        kind: String,
        message: String,
    },
    Text(String),
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observation::Typed { kind, message } => {
                write!(f, "[{}] {message}", kind.replace('_', " "))
            }
            Observation::Text(message) => f.write_str(message),
        }
    }
}

/// `GET /api/anomalies/analysis`.
///
/// The narrative fields (`narrative`, `what_changed`, `where_propagated`,
/// `degraded_components`) are optional; the structured report is
/// `anomaly`, `system_state`, `health` and `observations`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AnomalyAnalysis {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub anomaly: Option<AnomalyContext>,
    #[serde(default)]
    pub system_state: SystemState,
    #[serde(default)]
    pub health: HealthSection,
    #[serde(default)]
    pub observations: Vec<Observation>,

    #[serde(default)]
    pub narrative: Option<String>,
    #[serde(default)]
    pub what_changed: Option<String>,
    #[serde(default)]
    pub where_propagated: Option<String>,
    #[serde(default)]
    pub degraded_components: Vec<String>,
}

impl AnomalyAnalysis {
    /// Components as ranked by the backend.
    pub fn health_ranking(&self) -> &[RankedComponent] {
        &self.health.components_ranked
    }

    pub fn collapse_risk(&self) -> Option<f64> {
        self.system_state
            .global_health
            .as_ref()
            .and_then(|h| h.collapse_risk)
    }

    /// Global status during the anomaly, `UNKNOWN` when not reported.
    pub fn status(&self) -> &str {
        self.system_state
            .global_health
            .as_ref()
            .and_then(|h| h.status.as_deref())
            .unwrap_or("UNKNOWN")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_injection_is_valid() {
        assert!(AnomalyInjection::default().check().is_ok());
    }

    #[test]
    fn strength_outside_range_is_rejected() {
        let injection = AnomalyInjection {
            strength: Some(7.5),
            ..Default::default()
        };
        assert!(injection.check().is_err());

        let injection = AnomalyInjection {
            strength: None,
            ..Default::default()
        };
        assert!(injection.check().is_ok());
    }

    #[test]
    fn reversed_tick_range_is_rejected() {
        let injection = AnomalyInjection {
            from_tick: 300,
            to_tick: 200,
            ..Default::default()
        };
        assert!(injection.check().is_err());
    }

    #[test]
    fn inactive_report_has_no_window() {
        let report: ActiveAnomalies = serde_json::from_value(json!({"active": false})).unwrap();
        assert_eq!(report.current(), None);
        assert_eq!(report.window(), None);
    }

    #[test]
    fn active_report_exposes_first_window() {
        let report: ActiveAnomalies = serde_json::from_value(json!({
            "active": true,
            "total_points_modified": 40,
            "affected_components": ["C2"],
            "anomalies": [
                {"anomaly_type": "error_spike", "component_code": "C2", "from_tick": 100, "to_tick": 140}
            ]
        }))
        .unwrap();

        assert_eq!(report.window(), Some((100, 140)));
        assert_eq!(report.current().unwrap().anomaly_type, "error_spike");
    }

    #[test]
    fn impact_decodes_backend_report() {
        let impact: AnomalyImpact = serde_json::from_value(json!({
            "active": true,
            "anomaly": {
                "type": "error_spike",
                "from_tick": 100,
                "to_tick": 139,
                "duration_ticks": 40,
                "affected_components": ["C2", "C3"],
                "affected_signals": 2,
                "points_modified": 80
            },
            "alerts": {"total": 5, "by_severity": {"critical": 3, "warning": 2}, "by_component": {"C2": 5}},
            "components": [
                {"component_code": "C3", "health_score": 41.0, "open_alerts": 0, "severity_pressure": {}},
                {"component_code": "C2", "health_score": 62.5, "open_alerts": 5, "severity_pressure": {"critical": 3}}
            ],
            "metric_deviation": [{"signal_code": "C2.error_rate", "avg_delta_pct": 120.0, "max_delta_pct": 310.5}],
            "global_health": {"collapse_risk": 0.8, "status": "CRITICAL"}
        }))
        .unwrap();

        assert_eq!(impact.alert_count(), Some(5));
        assert_eq!(impact.alerts_by_severity().get("critical"), Some(&3));
        assert_eq!(impact.impacted_components(), vec!["C3", "C2"]);
        assert_eq!(impact.global_health.as_ref().and_then(|h| h.collapse_risk), Some(0.8));

        let window = impact.anomaly.as_ref().and_then(AnomalyContext::window).unwrap();
        assert_eq!((window.from_tick, window.to_tick, window.duration()), (100, 139, 40));
        assert_eq!(impact.anomaly.unwrap().kind.as_deref(), Some("error_spike"));
    }

    #[test]
    fn impact_reads_flattened_fields() {
        let impact: AnomalyImpact = serde_json::from_value(json!({
            "simulated_alerts_count": 4,
            "by_severity": {"critical": 1},
            "most_impacted_components": ["C1"],
            "global_health_during_anomaly": 72.5
        }))
        .unwrap();

        assert_eq!(impact.alert_count(), Some(4));
        assert_eq!(impact.alerts_by_severity().get("critical"), Some(&1));
        assert_eq!(impact.impacted_components(), vec!["C1"]);
    }

    #[test]
    fn analysis_keeps_backend_ranking_order() {
        let analysis: AnomalyAnalysis = serde_json::from_value(json!({
            "active": true,
            "anomaly": {
                "title": "Error spike on stream lane",
                "type": "error_spike",
                "pipeline": "stream_lane",
                "window": {"from_tick": 100, "to_tick": 200, "duration_ticks": 101},
                "expected_behavior": ["Error rate rises on C2"]
            },
            "system_state": {
                "global_health": {"collapse_risk": 0.45, "status": "DEGRADED"},
                "cascading_behavior": true
            },
            "health": {
                "components_ranked": [
                    {"component_label": "Ingest", "component_code": "C2", "open_alerts": 4, "health_score": 80.0},
                    {"component_label": "Gateway", "component_code": "C1", "open_alerts": 1, "health_score": 55.0}
                ]
            },
            "observations": [{"type": "alert_pressure", "message": "C2 carries most alerts"}, "free text"]
        }))
        .unwrap();

        let order: Vec<&str> = analysis
            .health_ranking()
            .iter()
            .map(|c| c.component_code.as_str())
            .collect();
        assert_eq!(order, vec!["C2", "C1"]);
        assert_eq!(analysis.collapse_risk(), Some(0.45));
        assert_eq!(analysis.status(), "DEGRADED");
        assert!(analysis.system_state.cascading_behavior);
        assert_eq!(analysis.observations[0].to_string(), "[alert pressure] C2 carries most alerts");
        assert_eq!(analysis.observations[1].to_string(), "free text");
        assert_eq!(analysis.anomaly.unwrap().window().map(|w| w.duration()), Some(101));
    }

    #[test]
    fn inactive_analysis_has_unknown_status() {
        let analysis: AnomalyAnalysis = serde_json::from_value(json!({"active": false})).unwrap();
        assert_eq!(analysis.status(), "UNKNOWN");
        assert_eq!(analysis.collapse_risk(), None);
        assert!(analysis.health_ranking().is_empty());
    }
}
