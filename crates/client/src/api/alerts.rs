use serde_json::Value;

use platformops_core::alerts::{
    AlertEvent, AlertRule, AlertSummary, EvaluateRequest, GeneratedRules, ResetEvaluateRequest,
};

use super::PlatformApi;
use crate::error::ApiError;
use crate::query::{encode_segment, QueryParams};

impl PlatformApi {
    /// `GET /api/alerts/ping`, the backend liveness probe.
    pub async fn ping(&self) -> Result<Value, ApiError> {
        self.http.get("/api/alerts/ping", &QueryParams::new()).await
    }

    pub async fn fetch_alert_rules(&self) -> Result<Vec<AlertRule>, ApiError> {
        self.http.get_as("/api/alerts/rules", &QueryParams::new()).await
    }

    /// Create default rules for every signal that has none.
    pub async fn generate_all_rules(&self) -> Result<GeneratedRules, ApiError> {
        let body = self
            .http
            .post::<()>("/api/alerts/rules/generate-all", &QueryParams::new(), None)
            .await?;
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    /// Run rule evaluation over the last `lookback_ticks` ticks.
    pub async fn evaluate_alerts(&self, request: EvaluateRequest) -> Result<Value, ApiError> {
        self.http
            .post("/api/alerts/evaluate", &QueryParams::new(), Some(&request))
            .await
    }

    /// Delete all alert events, then evaluate from scratch.
    pub async fn reset_and_evaluate(&self, request: ResetEvaluateRequest) -> Result<Value, ApiError> {
        self.http
            .post("/api/alerts/reset-and-evaluate", &QueryParams::new(), Some(&request))
            .await
    }

    /// `GET /api/alerts/events`. Absent filters are left out of the query.
    pub async fn fetch_alert_events(
        &self,
        signal_code: Option<&str>,
        status: Option<&str>,
        limit: i64,
    ) -> Result<Vec<AlertEvent>, ApiError> {
        let query = QueryParams::new()
            .push_opt("signal_code", signal_code)
            .push_opt("status", status)
            .push("limit", limit);
        self.http.get_as("/api/alerts/events", &query).await
    }

    pub async fn fetch_alert_summary(&self) -> Result<AlertSummary, ApiError> {
        self.http.get_as("/api/alerts/summary", &QueryParams::new()).await
    }

    pub async fn fetch_alerts_by_component(&self, code: &str) -> Result<Vec<AlertEvent>, ApiError> {
        let path = format!("/api/alerts/by-component/{}", encode_segment(code));
        self.http
            .get_as(&path, &QueryParams::new())
            .await
    }

    /// Alert spike patterns; the document is displayed as-is.
    pub async fn fetch_alert_spikes(&self) -> Result<Value, ApiError> {
        self.http
            .get("/api/analytics/patterns/spikes", &QueryParams::new())
            .await
    }
}
