//! Analytics endpoints. These are the loosely shaped ones, so every
//! response goes through an envelope decoder instead of strict serde.

use serde_json::{Map, Value};

use platformops_core::analytics::{
    AlertsStatsResponse, ChangeImpact, ChangeImpactResponse, CoverageResponse, EnvelopeResponse,
    ForecastPoint, ForecastResponse, HotspotsResponse, RankingsResponse, Regime, RegimesResponse,
    StressPoint, StressResponse,
};
use platformops_core::envelope::{unwrap_collection, unwrap_number, unwrap_object};
use platformops_core::types::Tick;

use super::PlatformApi;
use crate::error::ApiError;
use crate::query::{encode_segment, QueryParams};

impl PlatformApi {
    pub async fn fetch_global_health(&self) -> Result<f64, ApiError> {
        let body = self
            .http
            .get("/api/analytics/global-health", &QueryParams::new())
            .await?;
        Ok(unwrap_number(body).into_value())
    }

    pub async fn fetch_component_health(&self, code: &str) -> Result<f64, ApiError> {
        let path = format!("/api/analytics/component-health/{}", encode_segment(code));
        let body = self
            .http
            .get(&path, &QueryParams::new())
            .await?;
        Ok(unwrap_number(body).into_value())
    }

    pub async fn fetch_volatility(&self, signal_code: &str, window: i64) -> Result<f64, ApiError> {
        let query = QueryParams::new()
            .push("signal_code", signal_code)
            .push("window", window);
        let body = self.http.get("/api/analytics/volatility", &query).await?;
        Ok(unwrap_number(body).into_value())
    }

    pub async fn fetch_forecast(
        &self,
        signal_code: &str,
        horizon_ticks: i64,
    ) -> Result<Vec<ForecastPoint>, ApiError> {
        let query = QueryParams::new()
            .push("signal_code", signal_code)
            .push("horizon_ticks", horizon_ticks);
        let body = self.http.get("/api/analytics/forecast/signal", &query).await?;
        Ok(unwrap_collection::<ForecastResponse>(body).into_value())
    }

    pub async fn fetch_regimes(
        &self,
        component: &str,
        window: i64,
        bucket_size: i64,
    ) -> Result<Vec<Regime>, ApiError> {
        let query = QueryParams::new()
            .push("window", window)
            .push("bucket_size", bucket_size);
        let path = format!("/api/analytics/component-regimes/{}", encode_segment(component));
        let body = self
            .http
            .get(&path, &query)
            .await?;
        Ok(unwrap_collection::<RegimesResponse>(body).into_value())
    }

    pub async fn fetch_stress_curve(
        &self,
        component: &str,
        window: i64,
        bucket: i64,
    ) -> Result<Vec<StressPoint>, ApiError> {
        let query = QueryParams::new().push("window", window).push("bucket", bucket);
        let path = format!("/api/analytics/component-stress/{}", encode_segment(component));
        let body = self
            .http
            .get(&path, &query)
            .await?;
        Ok(unwrap_collection::<StressResponse>(body).into_value())
    }

    /// Impact of changes around `pivot_tick`; without a signal the backend
    /// ranks every signal.
    pub async fn fetch_change_impact(
        &self,
        signal_code: Option<&str>,
        pivot_tick: Tick,
        window: i64,
    ) -> Result<Vec<ChangeImpact>, ApiError> {
        let query = QueryParams::new()
            .push_opt("signal_code", signal_code)
            .push("pivot_tick", pivot_tick)
            .push("window", window);
        let body = self
            .http
            .get("/api/analytics/signal-change-impact", &query)
            .await?;
        Ok(unwrap_collection::<ChangeImpactResponse>(body).into_value())
    }

    pub async fn fetch_system_stats(&self) -> Result<Map<String, Value>, ApiError> {
        let body = self
            .http
            .get("/api/analytics/system-stats", &QueryParams::new())
            .await?;
        Ok(unwrap_object(body).into_value())
    }

    pub async fn fetch_alerts_stats(
        &self,
        from_tick: Option<Tick>,
        to_tick: Option<Tick>,
        limit: i64,
    ) -> Result<Vec<Value>, ApiError> {
        // A zero tick is treated as unset.
        let query = QueryParams::new()
            .push_opt("from_tick", from_tick.filter(|&t| t != 0))
            .push_opt("to_tick", to_tick.filter(|&t| t != 0))
            .push("limit", limit);
        let body = self.http.get("/api/analytics/alerts-stats", &query).await?;
        Ok(unwrap_collection::<AlertsStatsResponse>(body).into_value())
    }

    pub async fn fetch_component_rankings(&self, limit: i64) -> Result<Vec<Value>, ApiError> {
        let query = QueryParams::new().push("limit", limit);
        let body = self
            .http
            .get("/api/analytics/component-rankings", &query)
            .await?;
        Ok(unwrap_collection::<RankingsResponse>(body).into_value())
    }

    pub async fn fetch_signal_coverage(
        &self,
        window_ticks: i64,
        limit: i64,
    ) -> Result<Vec<Value>, ApiError> {
        let query = QueryParams::new()
            .push("window_ticks", window_ticks)
            .push("limit", limit);
        let body = self.http.get("/api/analytics/signal-coverage", &query).await?;
        Ok(unwrap_collection::<CoverageResponse>(body).into_value())
    }

    pub async fn fetch_active_hotspots(&self, limit: i64) -> Result<Vec<Value>, ApiError> {
        let query = QueryParams::new().push("limit", limit);
        let body = self.http.get("/api/analytics/active-hotspots", &query).await?;
        Ok(unwrap_collection::<HotspotsResponse>(body).into_value())
    }

    pub async fn fetch_component_time_analysis(
        &self,
        component: &str,
        max_ticks: i64,
    ) -> Result<Map<String, Value>, ApiError> {
        let query = QueryParams::new().push("max_ticks", max_ticks);
        let path = format!("/api/analytics/component-time-analysis/{}", encode_segment(component));
        let body = self
            .http
            .get(&path, &query)
            .await?;
        Ok(unwrap_object(body).into_value())
    }

    pub async fn fetch_signal_envelope(
        &self,
        signal_code: &str,
        window: i64,
        bucket: i64,
    ) -> Result<Vec<Value>, ApiError> {
        let query = QueryParams::new()
            .push("signal_code", signal_code)
            .push("window", window)
            .push("bucket", bucket);
        let body = self.http.get("/api/analytics/signal-envelope", &query).await?;
        Ok(unwrap_collection::<EnvelopeResponse>(body).into_value())
    }
}
