//! Analytics view models and the collection envelopes of each analytics
//! endpoint.
//!
//! Typed points accept the field names of both backend generations via
//! serde aliases. Endpoints whose rows the views only tabulate keep their
//! items as raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::CollectionResponse;
use crate::types::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub tick: Tick,
    #[serde(alias = "expected")]
    pub value: f64,
    #[serde(alias = "max", default)]
    pub upper: Option<f64>,
    #[serde(alias = "min", default)]
    pub lower: Option<f64>,
}

/// A stability classification for a tick range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regime {
    #[serde(alias = "from_tick")]
    pub start_tick: Tick,
    #[serde(alias = "to_tick")]
    pub end_tick: Tick,
    /// `stable`, `volatile` or `degraded`.
    #[serde(rename = "type", alias = "regime")]
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressPoint {
    #[serde(alias = "from_tick")]
    pub tick: Tick,
    #[serde(alias = "stress_score")]
    pub stress_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeImpact {
    pub change_tick: Tick,
    pub impact_score: f64,
    #[serde(default)]
    pub affected_signals: Vec<String>,
}

macro_rules! collection_response {
    ($(#[$meta:meta])* $name:ident, $key:literal, $item:ty) => {
        $(#[$meta])*
        pub struct $name;

        impl CollectionResponse for $name {
            const KEY: &'static str = $key;
            type Item = $item;
        }
    };
}

collection_response!(
    /// `GET /api/analytics/forecast/signal`
    ForecastResponse, "forecast", ForecastPoint
);
collection_response!(
    /// `GET /api/analytics/component-regimes/{code}`
    RegimesResponse, "regimes", Regime
);
collection_response!(
    /// `GET /api/analytics/component-stress/{code}`
    StressResponse, "stress", StressPoint
);
collection_response!(
    /// `GET /api/analytics/signal-change-impact`
    ChangeImpactResponse, "impacts", ChangeImpact
);
collection_response!(
    /// `GET /api/analytics/alerts-stats`
    AlertsStatsResponse, "stats", Value
);
collection_response!(
    /// `GET /api/analytics/component-rankings`
    RankingsResponse, "rankings", Value
);
collection_response!(
    /// `GET /api/analytics/signal-coverage`
    CoverageResponse, "coverage", Value
);
collection_response!(
    /// `GET /api/analytics/active-hotspots`
    HotspotsResponse, "hotspots", Value
);
collection_response!(
    /// `GET /api/analytics/signal-envelope`
    EnvelopeResponse, "envelope", Value
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{unwrap_collection, EnvelopeShape};
    use serde_json::json;

    #[test]
    fn forecast_accepts_backend_point_names() {
        let decoded = unwrap_collection::<ForecastResponse>(json!({
            "signal_code": "C1.api_qps",
            "forecast": [{"tick": 501, "expected": 12.0, "min": 10.0, "max": 14.0}]
        }));

        assert_eq!(decoded.shape, EnvelopeShape::Field("forecast"));
        assert_eq!(
            decoded.value,
            vec![ForecastPoint { tick: 501, value: 12.0, upper: Some(14.0), lower: Some(10.0) }]
        );
    }

    #[test]
    fn regimes_accept_bucket_names() {
        let decoded = unwrap_collection::<RegimesResponse>(json!({
            "regimes": [{"from_tick": 0, "to_tick": 59, "regime": "volatile", "alert_count": 3}]
        }));

        assert_eq!(decoded.value[0].kind, "volatile");
        assert_eq!(decoded.value[0].end_tick, 59);
    }

    #[test]
    fn stress_curve_under_series_key_falls_back_to_empty() {
        // The backend currently nests the curve under `series`, which no
        // client key matches.
        let decoded = unwrap_collection::<StressResponse>(json!({
            "component_code": "C1",
            "series": [{"from_tick": 0, "stress_score": 30}]
        }));

        assert!(decoded.is_fallback());
        assert!(decoded.value.is_empty());
    }

    #[test]
    fn bare_stress_curve_decodes() {
        let decoded = unwrap_collection::<StressResponse>(json!([{"tick": 20, "stress_level": 40}]));
        assert_eq!(decoded.value, vec![StressPoint { tick: 20, stress_level: 40.0 }]);
    }
}
