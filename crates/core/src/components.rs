//! Component overview, component details and signal time series.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Tick;

/// Backend-derived status of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComponentStatus {
    Ok,
    Degraded,
    Critical,
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComponentStatus::Ok => "OK",
            ComponentStatus::Degraded => "DEGRADED",
            ComponentStatus::Critical => "CRITICAL",
        })
    }
}

/// One row of `GET /api/system/overview`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentOverview {
    pub component_code: String,
    /// 0-100, computed by the backend on every fetch.
    pub health_score: f64,
    pub active_alerts: i64,
    pub status: ComponentStatus,
}

/// Metadata for one signal emitted by a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSignal {
    pub signal_code: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub polarity: Option<String>,
    #[serde(default)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDetails {
    #[serde(default)]
    pub component_code: Option<String>,
    #[serde(default)]
    pub health_score: Option<f64>,
    #[serde(default)]
    pub signals: Vec<ComponentSignal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    pub tick: Tick,
    pub value: f64,
}

/// Series keyed by signal code.
pub type TimeseriesSet = BTreeMap<String, Vec<TimeseriesPoint>>;

/// `GET /api/timeseries/multi` wraps its series under `signals`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MultiTimeseries {
    #[serde(default)]
    pub signals: TimeseriesSet,
}

/// Server-side transform applied to a signal before charting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    #[default]
    Raw,
    Aggregate,
    Derivative,
    Normalized,
}

impl Transform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transform::Raw => "raw",
            Transform::Aggregate => "aggregate",
            Transform::Derivative => "derivative",
            Transform::Normalized => "normalized",
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transform {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Transform::Raw),
            "aggregate" => Ok(Transform::Aggregate),
            "derivative" => Ok(Transform::Derivative),
            "normalized" => Ok(Transform::Normalized),
            other => Err(CoreError::Validation(format!("unknown transform '{other}'"))),
        }
    }
}

/// Merge several series into rows sorted by tick, one column per signal.
///
/// Ticks missing from a series yield `None` in that column.
pub fn merge_series(set: &TimeseriesSet) -> Vec<(Tick, Vec<Option<f64>>)> {
    let mut rows: BTreeMap<Tick, Vec<Option<f64>>> = BTreeMap::new();
    let width = set.len();

    for (column, series) in set.values().enumerate() {
        for point in series {
            rows.entry(point.tick).or_insert_with(|| vec![None; width])[column] = Some(point.value);
        }
    }

    rows.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overview_row_decodes() {
        let row: ComponentOverview = serde_json::from_value(json!({
            "component_code": "C1",
            "health_score": 87.5,
            "active_alerts": 2,
            "status": "DEGRADED"
        }))
        .unwrap();

        assert_eq!(row.status, ComponentStatus::Degraded);
        assert_eq!(row.status.to_string(), "DEGRADED");
    }

    #[test]
    fn transform_round_trips_through_str() {
        for t in [Transform::Raw, Transform::Aggregate, Transform::Derivative, Transform::Normalized] {
            assert_eq!(t.as_str().parse::<Transform>().unwrap(), t);
        }
        assert!("smoothed".parse::<Transform>().is_err());
    }

    #[test]
    fn merge_series_aligns_ticks() {
        let mut set = TimeseriesSet::new();
        set.insert(
            "a".into(),
            vec![TimeseriesPoint { tick: 1, value: 1.0 }, TimeseriesPoint { tick: 2, value: 2.0 }],
        );
        set.insert("b".into(), vec![TimeseriesPoint { tick: 2, value: 20.0 }]);

        let rows = merge_series(&set);
        assert_eq!(rows, vec![(1, vec![Some(1.0), None]), (2, vec![Some(2.0), Some(20.0)])]);
    }
}
