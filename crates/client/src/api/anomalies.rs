use platformops_core::anomalies::{
    ActiveAnomalies, AnomalyAnalysis, AnomalyImpact, AnomalyInjection, InjectionResult,
};

use super::PlatformApi;
use crate::error::ApiError;
use crate::query::QueryParams;

impl PlatformApi {
    /// Inject a synthetic anomaly. Parameters travel in the query string
    /// and the request has no body.
    ///
    /// The injection is validated first; an invalid one never reaches the
    /// backend.
    pub async fn inject_anomaly(
        &self,
        injection: &AnomalyInjection,
    ) -> Result<InjectionResult, ApiError> {
        injection.check()?;

        let query = QueryParams::new()
            .push("pipeline", &injection.pipeline)
            .push("anomaly_type", &injection.anomaly_type)
            .push("from_tick", injection.from_tick)
            .push("to_tick", injection.to_tick)
            .push_opt("strength", injection.strength);

        tracing::info!(
            pipeline = %injection.pipeline,
            anomaly_type = %injection.anomaly_type,
            from_tick = injection.from_tick,
            to_tick = injection.to_tick,
            "Injecting anomaly",
        );

        let body = self
            .http
            .post::<()>("/api/anomalies/inject", &query, None)
            .await?;
        Ok(serde_json::from_value(body).unwrap_or_default())
    }

    pub async fn fetch_active_anomaly(&self) -> Result<ActiveAnomalies, ApiError> {
        let body = self.http.get("/api/anomalies/active", &QueryParams::new()).await?;
        if body.is_null() {
            return Ok(ActiveAnomalies::default());
        }
        Ok(serde_json::from_value(body)?)
    }

    pub async fn fetch_anomaly_impact(&self) -> Result<AnomalyImpact, ApiError> {
        self.http.get_as("/api/anomalies/impact", &QueryParams::new()).await
    }

    pub async fn fetch_anomaly_analysis(&self) -> Result<AnomalyAnalysis, ApiError> {
        self.http
            .get_as("/api/anomalies/analysis", &QueryParams::new())
            .await
    }
}
