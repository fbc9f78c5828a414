use serde_json::Value;

use platformops_core::components::{ComponentDetails, MultiTimeseries, TimeseriesPoint, TimeseriesSet};
use platformops_core::types::Tick;

use super::PlatformApi;
use crate::error::ApiError;
use crate::query::{encode_segment, QueryParams};

impl PlatformApi {
    pub async fn fetch_component_details(&self, code: &str) -> Result<ComponentDetails, ApiError> {
        let path = format!("/api/components/{}", encode_segment(code));
        self.http
            .get_as(&path, &QueryParams::new())
            .await
    }

    /// Raw series for several signals in one request.
    pub async fn fetch_multi_timeseries(&self, signals: &[String]) -> Result<TimeseriesSet, ApiError> {
        let query = QueryParams::new().push("signals", signals.join(","));
        let multi: MultiTimeseries = self.http.get_as("/api/timeseries/multi", &query).await?;
        Ok(multi.signals)
    }

    pub async fn fetch_aggregate(
        &self,
        signal_code: &str,
        window: i64,
        agg: &str,
    ) -> Result<Vec<TimeseriesPoint>, ApiError> {
        let query = QueryParams::new()
            .push("signal_code", signal_code)
            .push("window", window)
            .push("agg", agg);
        let body = self.http.get("/api/timeseries/aggregate", &query).await?;
        Ok(points(body))
    }

    pub async fn fetch_derivative(&self, signal_code: &str) -> Result<Vec<TimeseriesPoint>, ApiError> {
        let query = QueryParams::new().push("signal_code", signal_code);
        let body = self.http.get("/api/timeseries/derivative", &query).await?;
        Ok(points(body))
    }

    pub async fn fetch_normalized(&self, signal_code: &str) -> Result<Vec<TimeseriesPoint>, ApiError> {
        let query = QueryParams::new().push("signal_code", signal_code);
        let body = self.http.get("/api/timeseries/normalized", &query).await?;
        Ok(points(body))
    }

    pub async fn fetch_timeseries(
        &self,
        signal_code: &str,
        from_tick: Option<Tick>,
        to_tick: Option<Tick>,
    ) -> Result<Vec<TimeseriesPoint>, ApiError> {
        let query = QueryParams::new()
            .push("signal_code", signal_code)
            .push_opt("from_tick", from_tick)
            .push_opt("to_tick", to_tick);
        let body = self.http.get("/api/timeseries", &query).await?;
        Ok(points(body))
    }
}

/// Transform endpoints return either a bare point list or one wrapped
/// under `data`/`points`; unusable points are skipped.
fn points(body: Value) -> Vec<TimeseriesPoint> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("points")) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn points_accept_bare_and_wrapped_lists() {
        let expected = vec![TimeseriesPoint { tick: 1, value: 2.5 }];
        assert_eq!(points(json!([{"tick": 1, "value": 2.5}])), expected);
        assert_eq!(points(json!({"data": [{"tick": 1, "value": 2.5}]})), expected);
        assert!(points(json!({"signal_code": "x"})).is_empty());
    }
}
